//! CSV directory price provider.
//!
//! One file per instrument, named `{CODE}_{MARKET}.csv`, with a header row
//! and columns `date,open,high,low,close,volume`.

use crate::adapters::tenor_anchor;
use crate::domain::error::{ProviderError, SheetError};
use crate::domain::price::PriceRow;
use crate::domain::tenor;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceProvider;
use chrono::{Local, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
    anchor: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            anchor: None,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SheetError> {
        let path = config
            .get_string("csv", "path")
            .ok_or_else(|| SheetError::ConfigMissing {
                section: "csv".into(),
                key: "path".into(),
            })?;
        Ok(Self::new(PathBuf::from(path)).with_anchor(tenor_anchor(config)?))
    }

    /// Measure tenors back from `anchor` instead of today.
    pub fn with_anchor(mut self, anchor: Option<NaiveDate>) -> Self {
        self.anchor = anchor;
        self
    }

    fn csv_path(&self, code: &str, market: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, market))
    }

    fn read_prices(&self, market: &str, code: &str) -> Result<Vec<PriceRow>, ProviderError> {
        let path = self.csv_path(code, market);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::NotFound {
                market: market.to_string(),
                code: code.to_string(),
                reason: format!("{} does not exist", path.display()),
            },
            _ => ProviderError::transient(format!("failed to read {}: {}", path.display(), e)),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut prices = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| ProviderError::transient(format!("CSV parse error: {}", e)))?;

            let date_str = field::<String>(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                ProviderError::transient(format!("invalid date format: {}", e))
            })?;

            prices.push(PriceRow {
                date,
                open: field(&record, 1, "open")?,
                high: field(&record, 2, "high")?,
                low: field(&record, 3, "low")?,
                close: field(&record, 4, "close")?,
                volume: field(&record, 5, "volume")?,
            });
        }
        Ok(prices)
    }
}

fn field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, ProviderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| ProviderError::transient(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| ProviderError::transient(format!("invalid {} value: {}", name, e)))
}

impl PriceProvider for CsvAdapter {
    async fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let anchor = self.anchor.unwrap_or_else(|| Local::now().date_naive());
        let range = tenor::range_for(tenor, anchor)?;

        let mut prices = self.read_prices(market, code)?;
        if let Some(range) = range {
            prices.retain(|p| range.contains(p.date));
        }
        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2023-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("BHP_ASX.csv"), csv_content).unwrap();
        fs::write(path.join("CBA_ASX.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(
            path.join("BAD_ASX.csv"),
            "date,open,high,low,close,volume\n2024-01-01,abc,1,1,1,1\n",
        )
        .unwrap();

        (dir, path)
    }

    fn anchor() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 31)
    }

    #[tokio::test]
    async fn fetch_all_history_sorted() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path).with_anchor(anchor());

        let prices = adapter.fetch_prices("ASX", "BHP", None).await.unwrap();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert_eq!(prices[2].date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_relative_eq!(prices[0].open, 100.0);
        assert_relative_eq!(prices[0].close, 105.0);
        assert_eq!(prices[0].volume, 50000);
    }

    #[tokio::test]
    async fn tenor_filters_from_anchor() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path).with_anchor(anchor());

        let prices = adapter.fetch_prices("ASX", "BHP", Some("1M")).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert!(prices.iter().all(|p| p.date.to_string().starts_with("2024-01")));
    }

    #[tokio::test]
    async fn empty_file_yields_no_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let prices = adapter.fetch_prices("ASX", "CBA", Some("1Y")).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_prices("ASX", "XYZ", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { ref code, .. } if code == "XYZ"));
    }

    #[tokio::test]
    async fn bad_values_are_transient() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_prices("ASX", "BAD", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transient { ref reason } if reason.contains("open")));
    }

    #[tokio::test]
    async fn invalid_tenor_is_transient() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_prices("ASX", "BHP", Some("1W")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transient { .. }));
    }
}
