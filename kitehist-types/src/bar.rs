use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Resolution, Symbol};

/// Canonical OHLCV bar for one time bucket.
///
/// `time` is the bucket start in UTC. Within a sequence returned by the fetcher,
/// times strictly increase and `high >= max(open, close) >= min(open, close) >= low >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start (UTC).
    pub time: DateTime<Utc>,
    /// Instrument the bar belongs to.
    pub symbol: Symbol,
    /// Bucket length.
    pub resolution: Resolution,
    /// First traded price.
    pub open: Decimal,
    /// Highest traded price.
    pub high: Decimal,
    /// Lowest traded price.
    pub low: Decimal,
    /// Last traded price.
    pub close: Decimal,
    /// Traded quantity.
    pub volume: u64,
}

impl Bar {
    /// Bucket start expressed in the exchange time zone.
    #[must_use]
    pub fn local_time(&self, tz: Tz) -> DateTime<Tz> {
        self.time.with_timezone(&tz)
    }

    /// Bucket end (exclusive).
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time + self.resolution.unit()
    }

    /// Whether the OHLC envelope and sign invariants hold.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let body_hi = self.open.max(self.close);
        let body_lo = self.open.min(self.close);
        self.low >= Decimal::ZERO && self.low <= body_lo && self.high >= body_hi
    }
}
