//! Two-dimensional cell store backing the price sheet.
//!
//! Cells live in a single row-major buffer of `rows * cols` entries. Growth
//! allocates a new buffer and copies every existing cell to the same
//! (row, col) address, so a resize can never lose or move content.

use crate::domain::cell::{Cell, CellValue};
use crate::domain::error::SheetError;

pub const DEFAULT_ROWS: usize = 100;
pub const DEFAULT_COLS: usize = 26;

/// Upper bound on the number of cells a grid may hold after growth.
pub const MAX_CELLS: usize = 1 << 24;

static EMPTY: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
    defaults: GridDimensions,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridDimensions::default())
    }
}

impl Grid {
    pub fn new(defaults: GridDimensions) -> Self {
        Self {
            cells: vec![Cell::default(); defaults.rows * defaults.cols],
            rows: defaults.rows,
            cols: defaults.cols,
            defaults,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions {
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Current value at (row, col). Out-of-range reads are empty.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cell(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub fn is_read_only(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_some_and(|c| c.read_only)
    }

    /// Dimensions after growing to hold a block ending at (`row_end`,
    /// `col_end`), or `None` if that many cells cannot be held.
    fn grown_size(&self, row_end: usize, col_end: usize) -> Option<(usize, usize)> {
        let new_rows = self.rows.max(row_end);
        let new_cols = self.cols.max(col_end);
        new_rows
            .checked_mul(new_cols)
            .filter(|n| *n <= MAX_CELLS.max(self.cells.len()))
            .map(|_| (new_rows, new_cols))
    }

    /// Grow to `new_rows` x `new_cols`, padding with empty cells. Callers
    /// pass dimensions from `grown_size`.
    fn ensure_size(&mut self, new_rows: usize, new_cols: usize) {
        if new_rows == self.rows && new_cols == self.cols {
            return;
        }

        if new_cols == self.cols {
            self.cells
                .resize(new_rows * new_cols, Cell::default());
        } else {
            let mut cells = vec![Cell::default(); new_rows * new_cols];
            for (r, row) in self.cells.chunks(self.cols.max(1)).enumerate() {
                let start = r * new_cols;
                cells[start..start + row.len()].clone_from_slice(row);
            }
            self.cells = cells;
        }

        tracing::debug!(
            from_rows = self.rows,
            from_cols = self.cols,
            rows = new_rows,
            cols = new_cols,
            "grid grown"
        );
        self.rows = new_rows;
        self.cols = new_cols;
    }

    /// Overwrite the `rows` x `cols` block anchored at (row, col) with
    /// `values` in row-major order, growing the grid first if needed.
    ///
    /// The shape and the grown size are checked before anything changes, so
    /// a rejected write leaves the grid untouched. Cells outside the block,
    /// including newly padded ones, are not altered. Written cells lose any
    /// read-only mark.
    pub fn set_range(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        values: Vec<CellValue>,
    ) -> Result<(), SheetError> {
        let out_of_bounds = || SheetError::OutOfBounds {
            row,
            col,
            rows,
            cols,
        };
        let expected = rows.checked_mul(cols).ok_or_else(out_of_bounds)?;
        if values.len() != expected {
            return Err(SheetError::RangeShape {
                rows,
                cols,
                expected,
                actual: values.len(),
            });
        }
        if expected == 0 {
            return Ok(());
        }

        let row_end = row.checked_add(rows).ok_or_else(out_of_bounds)?;
        let col_end = col.checked_add(cols).ok_or_else(out_of_bounds)?;
        let (new_rows, new_cols) = self
            .grown_size(row_end, col_end)
            .ok_or_else(out_of_bounds)?;
        self.ensure_size(new_rows, new_cols);

        let mut values = values.into_iter();
        for r in row..row_end {
            let start = r * self.cols + col;
            for cell in &mut self.cells[start..start + cols] {
                // length checked above
                cell.value = values.next().unwrap_or_default();
                cell.read_only = false;
            }
        }
        Ok(())
    }

    /// Single-cell edit. Read-only cells reject edits.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SheetError> {
        if self.is_read_only(row, col) {
            return Err(SheetError::ReadOnly { row, col });
        }
        self.set_range(row, col, 1, 1, vec![value])
    }

    /// Mark the in-bounds part of a block as read-only.
    pub fn protect_range(&mut self, row: usize, col: usize, rows: usize, cols: usize) {
        let row_end = row.saturating_add(rows).min(self.rows);
        let col_end = col.saturating_add(cols).min(self.cols);
        for r in row..row_end {
            for c in col..col_end {
                let i = r * self.cols + c;
                self.cells[i].read_only = true;
            }
        }
    }

    /// Replace everything with a fresh empty grid of the default size.
    pub fn clear(&mut self) {
        *self = Self::new(self.defaults);
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols.max(1))
    }
}
