//! Tenor shorthand (`30D`, `6M`, `1Y`) and the date ranges it selects.
//!
//! A tenor counts back from an anchor date by default: `1Y` anchored at
//! 2025-06-15 covers 2024-06-15 through 2025-06-15 inclusive. Month and year
//! arithmetic clamps to the last day of a shorter month.

use crate::domain::error::TenorError;
use chrono::{Days, Months, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenorUnit {
    Day,
    Month,
    Year,
}

impl TenorUnit {
    fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'D' => Some(Self::Day),
            'M' => Some(Self::Month),
            'Y' => Some(Self::Year),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Day => 'D',
            Self::Month => 'M',
            Self::Year => 'Y',
        }
    }

    fn add(self, n: u32, anchor: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => anchor.checked_add_days(Days::new(n as u64)),
            Self::Month => anchor.checked_add_months(Months::new(n)),
            Self::Year => anchor.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    fn sub(self, n: u32, anchor: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => anchor.checked_sub_days(Days::new(n as u64)),
            Self::Month => anchor.checked_sub_months(Months::new(n)),
            Self::Year => anchor.checked_sub_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenor {
    pub amount: u32,
    pub unit: TenorUnit,
}

impl Tenor {
    pub fn parse(input: &str) -> Result<Self, TenorError> {
        let invalid = || TenorError {
            input: input.to_string(),
        };

        let mut chars = input.chars();
        let unit = chars
            .next_back()
            .and_then(TenorUnit::from_char)
            .ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount = digits.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self { amount, unit })
    }

    /// The range ending at `anchor`.
    pub fn ending_at(self, anchor: NaiveDate) -> TenorRange {
        TenorRange {
            tenor: self,
            anchor,
            direction: Direction::Backward,
        }
    }

    /// The range starting at `anchor`.
    pub fn starting_from(self, anchor: NaiveDate) -> TenorRange {
        TenorRange {
            tenor: self,
            anchor,
            direction: Direction::Forward,
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenorRange {
    pub tenor: Tenor,
    pub anchor: NaiveDate,
    pub direction: Direction,
}

impl TenorRange {
    pub fn start(&self) -> NaiveDate {
        match self.direction {
            Direction::Backward => self
                .tenor
                .unit
                .sub(self.tenor.amount, self.anchor)
                .unwrap_or(NaiveDate::MIN),
            Direction::Forward => self.anchor,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self.direction {
            Direction::Backward => self.anchor,
            Direction::Forward => self
                .tenor
                .unit
                .add(self.tenor.amount, self.anchor)
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }
}

/// The range an optional tenor selects, ending at `anchor`. No tenor means
/// all available history.
pub fn range_for(tenor: Option<&str>, anchor: NaiveDate) -> Result<Option<TenorRange>, TenorError> {
    tenor
        .map(|t| Tenor::parse(t).map(|t| t.ending_at(anchor)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn anchor() -> NaiveDate {
        date(2025, 6, 15)
    }

    #[test]
    fn parse_years() {
        let t = Tenor::parse("2Y").unwrap();
        assert_eq!(t.amount, 2);
        assert_eq!(t.unit, TenorUnit::Year);
    }

    #[test]
    fn parse_months_and_days() {
        assert_eq!(
            Tenor::parse("6M").unwrap(),
            Tenor {
                amount: 6,
                unit: TenorUnit::Month
            }
        );
        assert_eq!(
            Tenor::parse("30D").unwrap(),
            Tenor {
                amount: 30,
                unit: TenorUnit::Day
            }
        );
    }

    #[test]
    fn parse_multi_digit_and_lowercase() {
        assert_eq!(Tenor::parse("12m").unwrap().to_string(), "12M");
    }

    #[test]
    fn parse_rejects_bad_input() {
        for bad in ["", "Y", "1W", "1.5Y", "-1Y", "Y1", "1 Y", "99999999999D"] {
            let err = Tenor::parse(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn backward_years() {
        let range = Tenor::parse("2Y").unwrap().ending_at(anchor());
        assert_eq!(range.start(), date(2023, 6, 15));
        assert_eq!(range.end(), anchor());
    }

    #[test]
    fn backward_months() {
        let range = Tenor::parse("3M").unwrap().ending_at(anchor());
        assert_eq!(range.start(), date(2025, 3, 15));
        assert_eq!(range.end(), anchor());
    }

    #[test]
    fn backward_days() {
        let range = Tenor::parse("10D").unwrap().ending_at(anchor());
        assert_eq!(range.start(), date(2025, 6, 5));
    }

    #[test]
    fn forward_years_and_months() {
        let range = Tenor::parse("2Y").unwrap().starting_from(anchor());
        assert_eq!(range.start(), anchor());
        assert_eq!(range.end(), date(2027, 6, 15));

        let range = Tenor::parse("6M").unwrap().starting_from(anchor());
        assert_eq!(range.end(), date(2025, 12, 15));
    }

    #[test]
    fn month_arithmetic_clamps() {
        let range = Tenor::parse("1M").unwrap().ending_at(date(2024, 3, 31));
        assert_eq!(range.start(), date(2024, 2, 29));
    }

    #[test]
    fn range_for_optional_tenor() {
        assert_eq!(range_for(None, anchor()).unwrap(), None);
        let range = range_for(Some("6M"), anchor()).unwrap().unwrap();
        assert_eq!(range.start(), date(2024, 12, 15));
        assert!(range_for(Some("6X"), anchor()).is_err());
    }

    #[test]
    fn contains_is_inclusive() {
        let range = Tenor::parse("1Y").unwrap().ending_at(date(2024, 12, 31));
        assert!(range.contains(date(2023, 12, 31)));
        assert!(range.contains(date(2024, 12, 31)));
        assert!(!range.contains(date(2023, 12, 30)));
        assert!(!range.contains(date(2025, 1, 1)));
    }
}
