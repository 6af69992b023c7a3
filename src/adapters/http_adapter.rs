//! HTTP price provider.
//!
//! Issues `GET {base_url}/api/prices/{code}?market={market}[&tenor={tenor}]`
//! and decodes a JSON array of price rows.

use crate::domain::error::{ProviderError, SheetError};
use crate::domain::price::PriceRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceProvider;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpAdapter {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> SheetError {
    SheetError::ConfigInvalid {
        section: "http".into(),
        key: key.into(),
        reason: reason.to_string(),
    }
}

impl HttpAdapter {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth_token: Option<String>,
    ) -> Result<Self, SheetError> {
        let base_url = Url::parse(base_url).map_err(|e| invalid("base_url", e))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("base_url", format!("'{}' cannot be a base", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid("timeout_secs", e))?;

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SheetError> {
        let base_url =
            config
                .get_string("http", "base_url")
                .ok_or_else(|| SheetError::ConfigMissing {
                    section: "http".into(),
                    key: "base_url".into(),
                })?;
        let timeout_secs = config.get_int("http", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
        if timeout_secs <= 0 {
            return Err(invalid("timeout_secs", "must be positive"));
        }
        let auth_token = config
            .get_string("http", "auth_token")
            .filter(|t| !t.trim().is_empty());

        Self::new(
            &base_url,
            Duration::from_secs(timeout_secs as u64),
            auth_token,
        )
    }

    /// Request URL for one lookup. Path and query parts are percent-encoded.
    pub fn prices_url(&self, market: &str, code: &str, tenor: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "prices", code]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.clear().append_pair("market", market);
            if let Some(tenor) = tenor {
                query.append_pair("tenor", tenor);
            }
        }
        url
    }

    async fn handle_response(
        &self,
        market: &str,
        code: &str,
        resp: reqwest::Response,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<Vec<PriceRow>>()
                .await
                .map_err(|e| ProviderError::transient(format!("invalid response body: {}", e)));
        }
        Err(classify_status(status, market, code))
    }
}

/// Maps a non-success status to the provider error taxonomy.
pub fn classify_status(status: StatusCode, market: &str, code: &str) -> ProviderError {
    let reason = format!("HTTP {}", status.as_u16());
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            market: market.to_string(),
            code: code.to_string(),
            reason,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized { reason },
        _ => ProviderError::Transient { reason },
    }
}

impl PriceProvider for HttpAdapter {
    async fn fetch_prices(
        &self,
        market: &str,
        code: &str,
        tenor: Option<&str>,
    ) -> Result<Vec<PriceRow>, ProviderError> {
        let url = self.prices_url(market, code, tenor);
        tracing::debug!(%url, "requesting prices");

        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::transient("request timed out")
            } else {
                ProviderError::transient(format!("request failed: {}", e))
            }
        })?;
        self.handle_response(market, code, resp).await
    }
}
