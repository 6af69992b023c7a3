//! Formula discovery over a grid snapshot.

use crate::domain::formula::{self, Formula};
use crate::domain::grid::Grid;

pub const DEFAULT_SCAN_ROWS: usize = 200;
pub const DEFAULT_SCAN_COLS: usize = 50;

/// Upper bound on the cells a single scan visits, anchored at (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub rows: usize,
    pub cols: usize,
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self {
            rows: DEFAULT_SCAN_ROWS,
            cols: DEFAULT_SCAN_COLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaHit {
    pub row: usize,
    pub col: usize,
    pub formula: Formula,
}

/// First formula in row-major order within the window, always starting
/// from (0, 0).
pub fn scan(grid: &Grid, window: ScanWindow) -> Option<FormulaHit> {
    let rows = grid.rows().min(window.rows);
    let cols = grid.cols().min(window.cols);

    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .find_map(|(row, col)| {
            let text = grid.get(row, col).as_text()?;
            formula::parse(text).map(|formula| FormulaHit { row, col, formula })
        })
}
