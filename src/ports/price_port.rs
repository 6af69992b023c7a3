//! Price history port trait.

use crate::domain::error::ProviderError;
use crate::domain::price::PriceRow;
use std::future::Future;

/// Request/response gateway to a price-history service.
///
/// Rows come back ascending by date. The returned future runs to completion
/// once polled; any timeout is the implementation's concern.
pub trait PriceProvider {
    fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> impl Future<Output = Result<Vec<PriceRow>, ProviderError>>;
}
