//! Cell values held by the price sheet grid.

use std::fmt;

/// The value of a single grid cell.
///
/// Formulas are not a separate variant: a formula is text that parses, and
/// is re-derived from the text on every scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The literal text of the cell, if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret raw user input: blank is empty, a finite decimal number is
    /// a number, everything else (formulas included) is text.
    pub fn from_input(input: &str) -> Self {
        if input.is_empty() {
            return Self::Empty;
        }
        let trimmed = input.trim();
        let numeric_start = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
        if numeric_start && !input.starts_with('=') {
            // "INF", "NaN" and "1e999" parse as f64 but are not finite
            if let Some(n) = trimmed.parse::<f64>().ok().filter(|n| n.is_finite()) {
                return Self::Number(n);
            }
        }
        Self::Text(input.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub read_only: bool,
}
