use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Kite Connect API root.
pub const DEFAULT_BASE_URL: &str = "https://api.kite.trade/";

/// Connection settings for the Kite Connect API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZerodhaConfig {
    /// API root; a trailing slash is added if missing.
    pub base_url: String,
    /// Kite Connect app key.
    pub api_key: String,
    /// Session access token.
    pub access_token: String,
    /// Exchange whose instrument dump resolves tickers (e.g. `NSE`).
    pub exchange: String,
    /// Transport timeout for a single HTTP request.
    pub timeout: Duration,
}

impl Default for ZerodhaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            access_token: String::new(),
            exchange: "NSE".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ZerodhaConfig {
    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("token {}:{}", self.api_key, self.access_token)
    }
}
