//! Historical price bar representation.

use crate::domain::cell::CellValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column labels of a resolved block, in field order.
pub const HEADERS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceRow {
    /// Cell values in header order.
    pub fn to_cells(&self) -> [CellValue; 6] {
        [
            CellValue::Text(self.date.format("%Y-%m-%d").to_string()),
            CellValue::Number(self.open),
            CellValue::Number(self.high),
            CellValue::Number(self.low),
            CellValue::Number(self.close),
            CellValue::Number(self.volume as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> PriceRow {
        PriceRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn cells_follow_header_order() {
        let cells = sample_row().to_cells();
        assert_eq!(cells.len(), HEADERS.len());
        assert_eq!(cells[0], CellValue::text("2024-01-15"));
        assert_eq!(cells[1], CellValue::Number(100.0));
        assert_eq!(cells[2], CellValue::Number(110.0));
        assert_eq!(cells[3], CellValue::Number(90.0));
        assert_eq!(cells[4], CellValue::Number(105.0));
        assert_eq!(cells[5], CellValue::Number(50_000.0));
    }

    #[test]
    fn deserializes_provider_json() {
        let json = r#"{"date":"2024-01-02","open":10.5,"high":10.8,"low":10.2,"close":10.6,"volume":900}"#;
        let row: PriceRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(row.volume, 900);
        assert!((row.close - 10.6).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_extra_fields() {
        let json = r#"{"id":7,"market":"ASX","code":"BHP","date":"2024-01-02","open":1,"high":2,"low":0.5,"close":1.5,"volume":3}"#;
        let row: PriceRow = serde_json::from_str(json).unwrap();
        assert!((row.high - 2.0).abs() < f64::EPSILON);
    }
}
