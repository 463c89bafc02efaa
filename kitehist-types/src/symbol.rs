use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KiteError;

/// Market (exchange group) an instrument is listed under.
///
/// Markets are compared case-insensitively; the stored form is lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Market(String);

impl Market {
    /// Indian cash and derivatives markets (NSE/BSE).
    pub const INDIA: &'static str = "india";
    /// US equity markets.
    pub const USA: &'static str = "usa";
    /// OANDA forex/CFD market.
    pub const OANDA: &'static str = "oanda";

    /// Build a market from any identifier; the value is lowercased and trimmed.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// The Indian market.
    #[must_use]
    pub fn india() -> Self {
        Self::new(Self::INDIA)
    }

    /// The US market.
    #[must_use]
    pub fn usa() -> Self {
        Self::new(Self::USA)
    }

    /// Borrow the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of security an instrument represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SecurityType {
    /// Listed equity (cash segment).
    Equity,
    /// Listed equity option.
    Option,
    /// Exchange-traded future.
    Future,
    /// Spot foreign exchange pair.
    Forex,
    /// Contract for difference.
    Cfd,
    /// Cryptocurrency pair.
    Crypto,
    /// Market index.
    Index,
    /// Physical commodity.
    Commodity,
}

impl SecurityType {
    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Option => "option",
            Self::Future => "future",
            Self::Forex => "forex",
            Self::Cfd => "cfd",
            Self::Crypto => "crypto",
            Self::Index => "index",
            Self::Commodity => "commodity",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityType {
    type Err = KiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equity" => Ok(Self::Equity),
            "option" => Ok(Self::Option),
            "future" => Ok(Self::Future),
            "forex" => Ok(Self::Forex),
            "cfd" => Ok(Self::Cfd),
            "crypto" => Ok(Self::Crypto),
            "index" => Ok(Self::Index),
            "commodity" => Ok(Self::Commodity),
            other => Err(KiteError::InvalidArg(format!(
                "unknown security type '{other}'"
            ))),
        }
    }
}

/// Instrument identity: ticker plus security type and market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    ticker: String,
    security_type: SecurityType,
    market: Market,
}

impl Symbol {
    /// Create a symbol.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the ticker is empty or contains whitespace.
    pub fn new(
        ticker: impl AsRef<str>,
        security_type: SecurityType,
        market: Market,
    ) -> Result<Self, KiteError> {
        let ticker = ticker.as_ref().trim();
        if ticker.is_empty() {
            return Err(KiteError::InvalidArg("ticker must not be empty".into()));
        }
        if ticker.chars().any(char::is_whitespace) {
            return Err(KiteError::InvalidArg(format!(
                "ticker '{ticker}' must not contain whitespace"
            )));
        }
        Ok(Self {
            ticker: ticker.to_ascii_uppercase(),
            security_type,
            market,
        })
    }

    /// Shorthand for an equity listed in the Indian market.
    ///
    /// # Errors
    /// Same as [`Symbol::new`].
    pub fn india_equity(ticker: impl AsRef<str>) -> Result<Self, KiteError> {
        Self::new(ticker, SecurityType::Equity, Market::india())
    }

    /// Uppercase ticker.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Security type.
    #[must_use]
    pub const fn security_type(&self) -> SecurityType {
        self.security_type
    }

    /// Listing market.
    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.ticker, self.security_type, self.market)
    }
}
