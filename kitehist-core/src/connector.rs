use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{KiteError, Resolution, Symbol};

/// A candle exactly as the broker reported it.
///
/// Values are unchecked: prices may be non-finite or out of envelope and the
/// volume may be negative. [`normalize`](crate::normalize()) validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    /// Bucket start with the broker's UTC offset.
    pub time: DateTime<FixedOffset>,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: i64,
    /// Open interest, when the broker returned it.
    pub oi: Option<i64>,
}

/// One broker call: a single window at a single interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    /// Instrument to fetch.
    pub symbol: Symbol,
    /// Canonical resolution the caller asked for.
    pub resolution: Resolution,
    /// Broker interval token (e.g. `"60minute"`).
    pub interval: &'static str,
    /// Window start (UTC).
    pub from: DateTime<Utc>,
    /// Window end (UTC).
    pub to: DateTime<Utc>,
    /// Exchange time zone used to render broker-local query times.
    pub exchange_tz: Tz,
}

/// Connector that can return raw candles for one window.
///
/// Implementations perform exactly one outbound request per call; pagination,
/// retries and normalization are the orchestrator's job.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Stable connector name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Fetch the raw candles covering `query.from..=query.to`.
    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError>;
}
