use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kitehist_middleware::RateLimiter;
use kitehist_types::{KiteError, RateLimitConfig};
use url::Url;

use crate::{ZerodhaConfig, ZerodhaConnector};

/// Fluent builder for [`ZerodhaConnector`].
#[derive(Debug, Clone, Default)]
pub struct ZerodhaConnectorBuilder {
    cfg: ZerodhaConfig,
    seeded: HashMap<String, u64>,
    limiter: Option<Arc<RateLimiter>>,
}

impl ZerodhaConnectorBuilder {
    /// Start from a complete configuration.
    #[must_use]
    pub fn from_config(cfg: ZerodhaConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    /// API root, e.g. a local test server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.cfg.base_url = url.into();
        self
    }

    /// App key and session token.
    #[must_use]
    pub fn credentials(mut self, api_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        self.cfg.api_key = api_key.into();
        self.cfg.access_token = access_token.into();
        self
    }

    /// Exchange used for instrument lookup.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.cfg.exchange = exchange.into();
        self
    }

    /// Transport timeout for each HTTP request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Register a known instrument token so the dump is not downloaded for it.
    #[must_use]
    pub fn instrument_token(mut self, ticker: &str, token: u64) -> Self {
        self.seeded.insert(ticker.to_ascii_uppercase(), token);
        self
    }

    /// Take a grant from a dedicated limiter before every HTTP request,
    /// including the instrument dump download.
    #[must_use]
    pub fn rate_limit(self, cfg: RateLimitConfig) -> Self {
        self.rate_limiter(Arc::new(RateLimiter::new(cfg)))
    }

    /// Like [`ZerodhaConnectorBuilder::rate_limit`] with a limiter shared across connectors.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the connector.
    ///
    /// # Errors
    /// Returns `InvalidArg` for missing credentials or an unparseable base URL,
    /// and `Transport` if the HTTP client cannot be created.
    pub fn build(self) -> Result<ZerodhaConnector, KiteError> {
        if self.cfg.api_key.trim().is_empty() || self.cfg.access_token.trim().is_empty() {
            return Err(KiteError::InvalidArg(
                "api key and access token are required".into(),
            ));
        }
        let mut base = self.cfg.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| KiteError::InvalidArg(format!("bad base url '{base}': {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(self.cfg.timeout)
            .build()
            .map_err(|e| KiteError::Transport {
                connector: crate::NAME.to_string(),
                msg: e.to_string(),
            })?;
        Ok(ZerodhaConnector::from_parts(
            self.cfg,
            base,
            client,
            self.seeded,
            self.limiter,
        ))
    }
}
