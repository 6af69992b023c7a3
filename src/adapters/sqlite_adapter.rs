//! SQLite price provider.
//!
//! Prices live in a `prices` table keyed by (market, code, date).

use crate::adapters::tenor_anchor;
use crate::domain::error::{ProviderError, SheetError};
use crate::domain::price::PriceRow;
use crate::domain::tenor;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceProvider;
use chrono::{Local, NaiveDate};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    anchor: Option<NaiveDate>,
}

fn storage(e: impl std::fmt::Display) -> SheetError {
    SheetError::Storage {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SheetError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| SheetError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4);
        let pool_size = u32::try_from(pool_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| SheetError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: format!("must be between 1 and {}, got {}", u32::MAX, pool_size),
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(storage)?;

        let adapter = Self {
            pool,
            anchor: tenor_anchor(config)?,
        };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, SheetError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(storage)?;

        Ok(Self { pool, anchor: None })
    }

    /// Measure tenors back from `anchor` instead of today.
    pub fn with_anchor(mut self, anchor: Option<NaiveDate>) -> Self {
        self.anchor = anchor;
        self
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, r2d2::Error> {
        self.pool.get()
    }

    pub fn initialize_schema(&self) -> Result<(), SheetError> {
        let conn = self.conn().map_err(storage)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                market TEXT NOT NULL,
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (market, code, date)
            );",
        )
        .map_err(storage)?;

        Ok(())
    }

    /// Insert prices for one instrument, skipping dates already stored.
    /// Returns how many rows were new.
    pub fn insert_prices(
        &self,
        market: &str,
        code: &str,
        prices: &[PriceRow],
    ) -> Result<usize, SheetError> {
        let mut conn = self.conn().map_err(storage)?;
        let tx = conn.transaction().map_err(storage)?;

        let mut inserted = 0;
        for price in prices {
            inserted += tx
                .execute(
                    "INSERT OR IGNORE INTO prices (market, code, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        market,
                        code,
                        price.date.format("%Y-%m-%d").to_string(),
                        price.open,
                        price.high,
                        price.low,
                        price.close,
                        price.volume
                    ],
                )
                .map_err(storage)?;
        }

        tx.commit().map_err(storage)?;
        tracing::info!(
            market,
            code,
            inserted,
            skipped = prices.len() - inserted,
            "prices persisted"
        );
        Ok(inserted)
    }

    fn query_prices(
        &self,
        market: &str,
        code: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let query_error =
            |e: rusqlite::Error| ProviderError::transient(format!("database query error: {}", e));
        let conn = self
            .conn()
            .map_err(|e| ProviderError::transient(format!("database error: {}", e)))?;

        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices
                 WHERE market = ?1 AND code = ?2 AND date >= ?3 AND date <= ?4
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![market, code, start, end], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceRow {
                    date,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(query_error)?;

        let prices = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        Ok(prices)
    }
}

impl PriceProvider for SqliteAdapter {
    async fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let anchor = self.anchor.unwrap_or_else(|| Local::now().date_naive());
        let (start, end) = match tenor::range_for(tenor, anchor)? {
            Some(range) => (
                range.start().format("%Y-%m-%d").to_string(),
                range.end().format("%Y-%m-%d").to_string(),
            ),
            None => ("0000-01-01".to_string(), "9999-12-31".to_string()),
        };

        self.query_prices(market, code, &start, &end)
    }
}
