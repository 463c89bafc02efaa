use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{KiteError, Symbol};

/// Time granularity of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    /// Individual trades/quotes.
    Tick,
    /// One-second bars.
    Second,
    /// One-minute bars.
    Minute,
    /// One-hour bars.
    Hour,
    /// One-day bars.
    Daily,
}

impl Resolution {
    /// All resolutions from finest to coarsest.
    pub const ALL: [Self; 5] = [
        Self::Tick,
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Daily,
    ];

    /// Length of one bar at this resolution. `Tick` has no fixed length and returns zero.
    #[must_use]
    pub fn unit(self) -> TimeDelta {
        match self {
            Self::Tick => TimeDelta::zero(),
            Self::Second => TimeDelta::seconds(1),
            Self::Minute => TimeDelta::minutes(1),
            Self::Hour => TimeDelta::hours(1),
            Self::Daily => TimeDelta::days(1),
        }
    }

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = KiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tick" => Ok(Self::Tick),
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "daily" | "day" => Ok(Self::Daily),
            other => Err(KiteError::InvalidArg(format!("unknown resolution '{other}'"))),
        }
    }
}

/// Requested shape of the returned bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BarType {
    /// OHLCV built from executed trades.
    #[default]
    TradeBar,
    /// Bid/ask bars.
    QuoteBar,
}

impl fmt::Display for BarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TradeBar => "trade-bar",
            Self::QuoteBar => "quote-bar",
        })
    }
}

/// Underlying tick stream a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TickType {
    /// Executed trades.
    #[default]
    Trade,
    /// Bid/ask quotes.
    Quote,
    /// Open interest snapshots.
    OpenInterest,
}

/// Price adjustment mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataNormalizationMode {
    /// Prices as traded.
    Raw,
    /// Split and dividend adjusted.
    #[default]
    Adjusted,
    /// Split adjusted only.
    SplitAdjusted,
    /// Dividends reinvested.
    TotalReturn,
}

/// Immutable description of a history fetch.
///
/// Construction never validates the time range: an inverted range is a valid
/// *value* that the fetcher rejects as unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Instrument to fetch.
    pub symbol: Symbol,
    /// Bar granularity.
    pub resolution: Resolution,
    /// Inclusive start (UTC).
    pub start: DateTime<Utc>,
    /// End of the range (UTC).
    pub end: DateTime<Utc>,
    /// Requested bar shape.
    pub bar_type: BarType,
    /// Exchange time zone used for broker-local query parameters.
    pub exchange_tz: Tz,
    /// Resolution used when fill-forwarding.
    pub fill_forward_resolution: Resolution,
    /// Whether to fill forward missing bars.
    pub fill_forward: bool,
    /// Include pre/post market sessions.
    pub extended_market_hours: bool,
    /// Price adjustment mode.
    pub normalization: DataNormalizationMode,
    /// Tick stream kind.
    pub tick_type: TickType,
}

impl HistoryRequest {
    /// Create a trade-bar request over `[start, end]` with Indian exchange defaults.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            resolution,
            start,
            end,
            bar_type: BarType::TradeBar,
            exchange_tz: chrono_tz::Asia::Kolkata,
            fill_forward_resolution: Resolution::Minute,
            fill_forward: false,
            extended_market_hours: false,
            normalization: DataNormalizationMode::Adjusted,
            tick_type: TickType::Trade,
        }
    }

    /// Request the `period` ending at `end`. A negative period yields an inverted range.
    #[must_use]
    pub fn lookback(
        symbol: Symbol,
        resolution: Resolution,
        end: DateTime<Utc>,
        period: TimeDelta,
    ) -> Self {
        Self::new(symbol, resolution, lookback_start(end, period), end)
    }

    /// Replace the requested bar shape.
    #[must_use]
    pub const fn with_bar_type(mut self, bar_type: BarType) -> Self {
        self.bar_type = bar_type;
        self
    }

    /// Replace the exchange time zone.
    #[must_use]
    pub const fn with_exchange_tz(mut self, tz: Tz) -> Self {
        self.exchange_tz = tz;
        self
    }

    /// Toggle fill-forward.
    #[must_use]
    pub const fn with_fill_forward(mut self, yes: bool) -> Self {
        self.fill_forward = yes;
        self
    }

    /// Toggle extended market hours.
    #[must_use]
    pub const fn with_extended_market_hours(mut self, yes: bool) -> Self {
        self.extended_market_hours = yes;
        self
    }

    /// Replace the price normalization mode.
    #[must_use]
    pub const fn with_normalization(mut self, mode: DataNormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    /// Replace the tick type.
    #[must_use]
    pub const fn with_tick_type(mut self, tick_type: TickType) -> Self {
        self.tick_type = tick_type;
        self
    }

    /// Length of the requested range; negative when inverted.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// `end - period`, clamped to the representable range instead of overflowing.
///
/// A period too long to subtract starts at the earliest instant; a negative one
/// too long to add starts at the latest, so the range stays inverted.
#[must_use]
pub fn lookback_start(end: DateTime<Utc>, period: TimeDelta) -> DateTime<Utc> {
    end.checked_sub_signed(period).unwrap_or(if period > TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
