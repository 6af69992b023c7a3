//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "http")]
pub mod http_adapter;
pub mod sheet_csv_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;

use crate::domain::error::SheetError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// The `[tenor] anchor` date local providers measure tenors from, if set.
pub fn tenor_anchor(config: &dyn ConfigPort) -> Result<Option<NaiveDate>, SheetError> {
    config
        .get_string("tenor", "anchor")
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                SheetError::ConfigInvalid {
                    section: "tenor".into(),
                    key: "anchor".into(),
                    reason: format!("'{}' is not a YYYY-MM-DD date: {}", s, e),
                }
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn anchor_absent() {
        let config = FileConfigAdapter::from_string("[csv]\npath = data\n").unwrap();
        assert_eq!(tenor_anchor(&config).unwrap(), None);
    }

    #[test]
    fn anchor_parsed() {
        let config = FileConfigAdapter::from_string("[tenor]\nanchor = 2024-06-30\n").unwrap();
        assert_eq!(tenor_anchor(&config).unwrap(), NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn anchor_invalid() {
        let config = FileConfigAdapter::from_string("[tenor]\nanchor = 30/06/2024\n").unwrap();
        assert!(matches!(
            tenor_anchor(&config),
            Err(SheetError::ConfigInvalid { ref key, .. }) if key == "anchor"
        ));
    }
}
