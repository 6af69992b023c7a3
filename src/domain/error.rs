//! Domain error types.

/// A tenor string that does not match `<amount><unit>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tenor format: '{input}'. Expected pattern like '2Y', '6M', or '30D'")]
pub struct TenorError {
    pub input: String,
}

/// Failure reported by a price provider.
///
/// Every kind is terminal for the request that produced it. Retrying means
/// issuing another resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no prices for {code} on {market}: {reason}")]
    NotFound {
        market: String,
        code: String,
        reason: String,
    },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("{reason}")]
    Transient { reason: String },
}

impl ProviderError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }
}

impl From<TenorError> for ProviderError {
    fn from(err: TenorError) -> Self {
        Self::transient(err.to_string())
    }
}

/// Top-level error type for pricesheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("a resolution is already in progress")]
    Busy,

    #[error("cell ({row}, {col}) is read-only")]
    ReadOnly { row: usize, col: usize },

    #[error("range of {rows}x{cols} expects {expected} values, got {actual}")]
    RangeShape {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("range at ({row}, {col}) of {rows}x{cols} exceeds the addressable grid size")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Failed to fetch prices: {0}")]
    Lookup(#[from] ProviderError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SheetError> for std::process::ExitCode {
    fn from(err: &SheetError) -> Self {
        let code: u8 = match err {
            SheetError::Io(_) | SheetError::Storage { .. } => 1,
            SheetError::ConfigParse { .. }
            | SheetError::ConfigMissing { .. }
            | SheetError::ConfigInvalid { .. } => 2,
            SheetError::Lookup(_) => 3,
            SheetError::Busy
            | SheetError::ReadOnly { .. }
            | SheetError::RangeShape { .. }
            | SheetError::OutOfBounds { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
