//! Configuration validation.
//!
//! Checks every sheet and provider setting before a sheet is built, so bad
//! values surface as config errors rather than mid-resolution failures.

use crate::domain::error::SheetError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const PROVIDER_KINDS: [&str; 3] = ["http", "csv", "sqlite"];

pub fn validate_sheet_config(config: &dyn ConfigPort) -> Result<(), SheetError> {
    for key in ["rows", "cols", "scan_rows", "scan_cols"] {
        validate_positive(config, "sheet", key)?;
    }
    validate_provider(config)?;
    validate_anchor(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SheetError {
    SheetError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SheetError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SheetError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// An optional integer key; when present it must parse and be positive.
fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SheetError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(()),
        Ok(_) => Err(invalid(section, key, format!("{} must be positive", key))),
        Err(_) => Err(invalid(section, key, format!("'{}' is not an integer", raw))),
    }
}

fn validate_provider(config: &dyn ConfigPort) -> Result<(), SheetError> {
    let kind = required(config, "provider", "kind")?.to_lowercase();
    match kind.as_str() {
        "http" => {
            let base_url = required(config, "http", "base_url")?;
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(invalid(
                    "http",
                    "base_url",
                    "base_url must start with http:// or https://",
                ));
            }
            validate_positive(config, "http", "timeout_secs")?;
        }
        "csv" => {
            required(config, "csv", "path")?;
        }
        "sqlite" => {
            required(config, "sqlite", "path")?;
            validate_positive(config, "sqlite", "pool_size")?;
        }
        other => {
            return Err(invalid(
                "provider",
                "kind",
                format!(
                    "unknown provider '{}', expected one of {}",
                    other,
                    PROVIDER_KINDS.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

fn validate_anchor(config: &dyn ConfigPort) -> Result<(), SheetError> {
    if let Some(value) = config.get_string("tenor", "anchor") {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| invalid("tenor", "anchor", "anchor must be YYYY-MM-DD"))?;
    }
    Ok(())
}
