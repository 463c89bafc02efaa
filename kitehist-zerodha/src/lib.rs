//! kitehist-zerodha
//!
//! Connector implementing `CandleProvider` over the Kite Connect REST API.
//! One call fetches one window from
//! `GET /instruments/historical/{token}/{interval}`; tickers are resolved to
//! instrument tokens through the exchange instrument dump, fetched once and cached.
//! A limiter set with [`ZerodhaConnectorBuilder::rate_limit`] is charged once per
//! HTTP request, so the dump download counts against the budget too.
#![warn(missing_docs)]

mod builder;
mod config;
mod instruments;
mod wire;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kitehist_core::{CandleProvider, CandleQuery, RawCandle, Symbol};
use kitehist_middleware::RateLimiter;
use kitehist_types::KiteError;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tokio::sync::OnceCell;
use url::Url;

pub use builder::ZerodhaConnectorBuilder;
pub use config::{DEFAULT_BASE_URL, ZerodhaConfig};
pub use instruments::parse_instruments;
pub use wire::parse_candles;

pub(crate) const NAME: &str = "kitehist-zerodha";

/// Kite Connect historical-candle connector.
pub struct ZerodhaConnector {
    cfg: ZerodhaConfig,
    base: Url,
    client: reqwest::Client,
    seeded: HashMap<String, u64>,
    instruments: OnceCell<HashMap<String, u64>>,
    limiter: Option<Arc<RateLimiter>>,
}

impl ZerodhaConnector {
    /// Start building a connector with default settings.
    #[must_use]
    pub fn builder() -> ZerodhaConnectorBuilder {
        ZerodhaConnectorBuilder::default()
    }

    pub(crate) fn from_parts(
        cfg: ZerodhaConfig,
        base: Url,
        client: reqwest::Client,
        seeded: HashMap<String, u64>,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Self {
        Self {
            cfg,
            base,
            client,
            seeded,
            instruments: OnceCell::new(),
            limiter,
        }
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ZerodhaConfig {
        &self.cfg
    }

    /// Limiter charged per HTTP request, if any.
    #[must_use]
    pub const fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    async fn get(&self, url: Url) -> Result<String, KiteError> {
        let auth = HeaderValue::from_str(&self.cfg.authorization())
            .map_err(|_| KiteError::InvalidArg("credentials are not valid header text".into()))?;
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let resp = self
            .client
            .get(url)
            .header("X-Kite-Version", "3")
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| wire::transport_error(&e))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| wire::transport_error(&e))?;
        if !status.is_success() {
            return Err(wire::status_error(status, &headers, &body));
        }
        Ok(body)
    }

    /// Resolve `symbol` to its instrument token.
    ///
    /// Pre-seeded tokens win; otherwise the exchange dump is downloaded on
    /// first use and reused afterwards.
    ///
    /// # Errors
    /// Returns `NotFound` for tickers absent from the dump, or the error that
    /// prevented downloading it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "kitehist_zerodha::instrument_token", skip(self), fields(symbol = %symbol))
    )]
    pub async fn instrument_token(&self, symbol: &Symbol) -> Result<u64, KiteError> {
        let ticker = symbol.ticker();
        if let Some(token) = self.seeded.get(ticker) {
            return Ok(*token);
        }
        let table = self
            .instruments
            .get_or_try_init(|| async {
                let url = self
                    .base
                    .join(&format!("instruments/{}", self.cfg.exchange))
                    .map_err(|e| KiteError::InvalidArg(format!("bad base url: {e}")))?;
                let body = self.get(url).await?;
                let table = parse_instruments(&body, &self.cfg.exchange)?;
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    exchange = %self.cfg.exchange,
                    instruments = table.len(),
                    "loaded instrument dump"
                );
                Ok::<_, KiteError>(table)
            })
            .await?;
        table
            .get(ticker)
            .copied()
            .ok_or_else(|| KiteError::not_found(format!("instrument token for {ticker}")))
    }
}

#[async_trait]
impl CandleProvider for ZerodhaConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kitehist_zerodha::fetch_candles",
            skip(self, query),
            fields(symbol = %query.symbol, interval = query.interval, from = %query.from, to = %query.to),
        )
    )]
    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        let token = self.instrument_token(&query.symbol).await?;
        let url = wire::historical_url(&self.base, token, query)?;
        let body = self.get(url).await?;
        parse_candles(&body)
    }
}
