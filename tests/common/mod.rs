#![allow(dead_code)]

use chrono::NaiveDate;
use pricesheet::domain::cell::CellValue;
use pricesheet::domain::dispatcher::{PriceSheet, SheetConfig};
use pricesheet::domain::error::ProviderError;
pub use pricesheet::domain::price::PriceRow;
use pricesheet::ports::price_port::PriceProvider;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::Notify;

/// One recorded provider request: (market, code, tenor).
pub type Call = (String, String, Option<String>);

pub struct MockPriceProvider {
    pub data: HashMap<(String, String), Vec<PriceRow>>,
    pub errors: HashMap<String, ProviderError>,
    pub calls: RefCell<Vec<Call>>,
    gate: Option<Rc<Notify>>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_prices(mut self, market: &str, code: &str, prices: Vec<PriceRow>) -> Self {
        self.data
            .insert((market.to_string(), code.to_string()), prices);
        self
    }

    pub fn with_error(mut self, code: &str, err: ProviderError) -> Self {
        self.errors.insert(code.to_string(), err);
        self
    }

    /// Hold every request until `gate` is notified.
    pub fn with_gate(mut self, gate: Rc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PriceProvider for MockPriceProvider {
    async fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        self.calls.borrow_mut().push((
            market.to_string(),
            code.to_string(),
            tenor.map(str::to_string),
        ));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.errors.get(code) {
            return Err(err.clone());
        }
        Ok(self
            .data
            .get(&(market.to_string(), code.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn make_price(date: &str, open: f64, high: f64, low: f64, close: f64, volume: i64) -> PriceRow {
    PriceRow {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// `n` consecutive daily prices starting 2024-01-01 with rising closes.
pub fn make_prices(n: usize) -> Vec<PriceRow> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            PriceRow {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 * (i as i64 + 1),
            }
        })
        .collect()
}

pub fn text(s: &str) -> CellValue {
    CellValue::text(s)
}

pub fn sheet_with(
    provider: MockPriceProvider,
    config: SheetConfig,
    cells: &[(usize, usize, &str)],
) -> PriceSheet<MockPriceProvider> {
    let sheet = PriceSheet::new(provider, config);
    for &(row, col, value) in cells {
        sheet.set_cell(row, col, text(value)).unwrap();
    }
    sheet
}
