//! Formula resolution: scan, dispatch one provider request, write back.
//!
//! Each `resolve` call handles at most one formula. It scans from (0, 0),
//! sends the first formula found to the provider, and on success writes a
//! header row plus one row per price bar anchored at the formula cell. The
//! header replaces the formula text, so the next call moves on to the next
//! formula. A failed lookup writes nothing, so the same formula is retried
//! next time.
//!
//! The sheet is driven from a single thread. The provider await is the only
//! suspension point; while it is outstanding the sheet is `Awaiting` and any
//! other `resolve` is rejected with [`SheetError::Busy`]. `Writing` is entered
//! and left with no suspension point in between, so callers on the same
//! thread never observe it; the check in `set_cell` only guards that
//! ordering.

use std::cell::RefCell;

use crate::domain::cell::CellValue;
use crate::domain::error::SheetError;
use crate::domain::formula::Formula;
use crate::domain::grid::{Grid, GridDimensions};
use crate::domain::price::{HEADERS, PriceRow};
use crate::domain::scan::{FormulaHit, ScanWindow, scan};
use crate::ports::price_port::PriceProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Awaiting {
        row: usize,
        col: usize,
        formula: Formula,
    },
    Writing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A formula was replaced by `rows` price rows under a header.
    Resolved {
        row: usize,
        col: usize,
        formula: Formula,
        rows: usize,
    },
    /// Nothing in the scan window parsed as a formula.
    NoFormula,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetConfig {
    pub grid: GridDimensions,
    pub window: ScanWindow,
}

/// Header plus one row per price bar, row-major, with its shape.
pub fn result_block(prices: &[PriceRow]) -> (usize, usize, Vec<CellValue>) {
    let cols = HEADERS.len();
    let mut values = Vec::with_capacity((prices.len() + 1) * cols);
    values.extend(HEADERS.iter().map(|h| CellValue::text(*h)));
    for price in prices {
        values.extend(price.to_cells());
    }
    (prices.len() + 1, cols, values)
}

/// Returns the state to `Idle` however the in-flight call ends, including
/// when its future is dropped.
struct IdleOnDrop<'a>(&'a RefCell<DispatchState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.borrow_mut() = DispatchState::Idle;
    }
}

pub struct PriceSheet<P> {
    provider: P,
    window: ScanWindow,
    grid: RefCell<Grid>,
    state: RefCell<DispatchState>,
    last_error: RefCell<Option<String>>,
}

impl<P: PriceProvider> PriceSheet<P> {
    pub fn new(provider: P, config: SheetConfig) -> Self {
        Self {
            provider,
            window: config.window,
            grid: RefCell::new(Grid::new(config.grid)),
            state: RefCell::new(DispatchState::Idle),
            last_error: RefCell::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> DispatchState {
        self.state.borrow().clone()
    }

    pub fn get(&self, row: usize, col: usize) -> CellValue {
        self.grid.borrow().get(row, col).clone()
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.grid.borrow().dimensions()
    }

    pub fn snapshot(&self) -> Grid {
        self.grid.borrow().clone()
    }

    /// Message of the most recent failed lookup, cleared by the next dispatch.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// User edit of a single cell. Allowed while a lookup is outstanding,
    /// never while a result is being written.
    pub fn set_cell(&self, row: usize, col: usize, value: CellValue) -> Result<(), SheetError> {
        if matches!(*self.state.borrow(), DispatchState::Writing) {
            return Err(SheetError::Busy);
        }
        self.grid.borrow_mut().set(row, col, value)
    }

    /// Discard everything, including unresolved formulas, and start over with
    /// a default-sized empty grid.
    pub fn clear(&self) -> Result<(), SheetError> {
        if *self.state.borrow() != DispatchState::Idle {
            return Err(SheetError::Busy);
        }
        self.grid.borrow_mut().clear();
        *self.last_error.borrow_mut() = None;
        tracing::info!("sheet cleared");
        Ok(())
    }

    fn begin(&self) -> Result<Option<FormulaHit>, SheetError> {
        let mut state = self.state.borrow_mut();
        if *state != DispatchState::Idle {
            tracing::warn!(state = ?state, "resolve rejected, sheet busy");
            return Err(SheetError::Busy);
        }

        let hit = scan(&self.grid.borrow(), self.window);
        if let Some(hit) = &hit {
            *state = DispatchState::Awaiting {
                row: hit.row,
                col: hit.col,
                formula: hit.formula.clone(),
            };
        }
        Ok(hit)
    }

    /// Resolve the first formula in the scan window.
    pub async fn resolve(&self) -> Result<Resolution, SheetError> {
        let Some(FormulaHit { row, col, formula }) = self.begin()? else {
            tracing::debug!("no formula in scan window");
            return Ok(Resolution::NoFormula);
        };
        let _idle = IdleOnDrop(&self.state);
        *self.last_error.borrow_mut() = None;

        tracing::info!(row, col, %formula, "fetching prices");
        let prices = match self
            .provider
            .fetch_prices(&formula.market, &formula.code, formula.tenor.as_deref())
            .await
        {
            Ok(prices) => prices,
            Err(e) => {
                tracing::warn!(row, col, %formula, error = %e, "price lookup failed");
                let err = SheetError::Lookup(e);
                *self.last_error.borrow_mut() = Some(err.to_string());
                return Err(err);
            }
        };

        *self.state.borrow_mut() = DispatchState::Writing;
        let (rows, cols, values) = result_block(&prices);
        {
            let mut grid = self.grid.borrow_mut();
            grid.set_range(row, col, rows, cols, values)?;
            grid.protect_range(row, col, rows, cols);
        }
        tracing::info!(row, col, %formula, rows = prices.len(), "prices written");

        Ok(Resolution::Resolved {
            row,
            col,
            formula,
            rows: prices.len(),
        })
    }

    /// Resolve formulas one at a time until none remain, stopping at the
    /// first failure. Returns how many were resolved.
    pub async fn resolve_all(&self) -> Result<usize, SheetError> {
        let mut resolved = 0;
        while let Resolution::Resolved { .. } = self.resolve().await? {
            resolved += 1;
        }
        Ok(resolved)
    }
}
