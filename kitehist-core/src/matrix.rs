//! Declarative table of which requests a broker can serve.
//!
//! A [`SupportMatrix`] is an ordered list of [`SupportEntry`] rows. Each row
//! matches on market, security type, resolution and bar type and carries a
//! [`Verdict`]. The first matching row decides; when nothing matches the request
//! is unsupported.

use serde::{Deserialize, Serialize};

use crate::{BarType, HistoryRequest, Market, Resolution, SecurityType, UnsupportedReason};

/// Value pattern for one dimension of a support row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern<T> {
    /// Matches any value.
    Any,
    /// Matches exactly this value.
    Is(T),
    /// Matches every value except this one.
    Not(T),
    /// Matches any of these values.
    OneOf(Vec<T>),
    /// Matches any value not listed.
    NoneOf(Vec<T>),
}

impl<T: PartialEq> Pattern<T> {
    /// Whether `value` satisfies the pattern.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Is(v) => v == value,
            Self::Not(v) => v != value,
            Self::OneOf(vs) => vs.contains(value),
            Self::NoneOf(vs) => !vs.contains(value),
        }
    }
}

impl<T> Default for Pattern<T> {
    fn default() -> Self {
        Self::Any
    }
}

/// Request dimension named by a rejecting row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// Listing market.
    Market,
    /// Security type.
    SecurityType,
    /// Bar resolution.
    Resolution,
    /// Bar shape.
    DataType,
}

/// Outcome attached to a support row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The request is servable.
    Supported,
    /// The request is rejected because of the named dimension.
    Reject(Dimension),
}

/// One row of the support table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportEntry {
    /// Market pattern.
    pub market: Pattern<Market>,
    /// Security type pattern.
    pub security_type: Pattern<SecurityType>,
    /// Resolution pattern.
    pub resolution: Pattern<Resolution>,
    /// Bar type pattern.
    pub bar_type: Pattern<BarType>,
    /// Verdict when all patterns match.
    pub verdict: Verdict,
}

impl SupportEntry {
    /// A row that matches everything and yields `verdict`; narrow it with the setters.
    #[must_use]
    pub fn new(verdict: Verdict) -> Self {
        Self {
            market: Pattern::Any,
            security_type: Pattern::Any,
            resolution: Pattern::Any,
            bar_type: Pattern::Any,
            verdict,
        }
    }

    /// Restrict the market.
    #[must_use]
    pub fn market(mut self, p: Pattern<Market>) -> Self {
        self.market = p;
        self
    }

    /// Restrict the security type.
    #[must_use]
    pub fn security_type(mut self, p: Pattern<SecurityType>) -> Self {
        self.security_type = p;
        self
    }

    /// Restrict the resolution.
    #[must_use]
    pub fn resolution(mut self, p: Pattern<Resolution>) -> Self {
        self.resolution = p;
        self
    }

    /// Restrict the bar type.
    #[must_use]
    pub fn bar_type(mut self, p: Pattern<BarType>) -> Self {
        self.bar_type = p;
        self
    }

    fn matches(
        &self,
        market: &Market,
        security_type: SecurityType,
        resolution: Resolution,
        bar_type: BarType,
    ) -> bool {
        self.market.matches(market)
            && self.security_type.matches(&security_type)
            && self.resolution.matches(&resolution)
            && self.bar_type.matches(&bar_type)
    }
}

/// Ordered support table for one broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportMatrix {
    home: Market,
    entries: Vec<SupportEntry>,
}

impl SupportMatrix {
    /// Start an empty table for a broker whose home market is `home`.
    #[must_use]
    pub fn builder(home: Market) -> SupportMatrixBuilder {
        SupportMatrixBuilder {
            home,
            entries: Vec::new(),
        }
    }

    /// Zerodha/Kite Connect: Indian equities at minute, hour or daily trade bars.
    ///
    /// Rows are ordered market, security type, resolution, data type so the
    /// reported reason is deterministic when several dimensions are wrong.
    #[must_use]
    pub fn zerodha() -> Self {
        let home = Market::india();
        let served = vec![Resolution::Minute, Resolution::Hour, Resolution::Daily];
        Self::builder(home.clone())
            .rule(
                SupportEntry::new(Verdict::Reject(Dimension::Market))
                    .market(Pattern::Not(home.clone())),
            )
            .rule(
                SupportEntry::new(Verdict::Reject(Dimension::SecurityType))
                    .security_type(Pattern::Not(SecurityType::Equity)),
            )
            .rule(
                SupportEntry::new(Verdict::Reject(Dimension::Resolution))
                    .resolution(Pattern::NoneOf(served.clone())),
            )
            .rule(
                SupportEntry::new(Verdict::Reject(Dimension::DataType))
                    .bar_type(Pattern::Not(BarType::TradeBar)),
            )
            .rule(
                SupportEntry::new(Verdict::Supported)
                    .market(Pattern::Is(home))
                    .security_type(Pattern::Is(SecurityType::Equity))
                    .resolution(Pattern::OneOf(served))
                    .bar_type(Pattern::Is(BarType::TradeBar)),
            )
            .build()
    }

    /// Broker home market.
    #[must_use]
    pub const fn home_market(&self) -> &Market {
        &self.home
    }

    /// Table rows in evaluation order.
    #[must_use]
    pub fn entries(&self) -> &[SupportEntry] {
        &self.entries
    }

    /// Resolve the dimensions against the table.
    ///
    /// # Errors
    /// Returns the reason of the first rejecting row, or `NoMatchingRule` when
    /// no row matches.
    pub fn check(
        &self,
        market: &Market,
        security_type: SecurityType,
        resolution: Resolution,
        bar_type: BarType,
    ) -> Result<(), UnsupportedReason> {
        let verdict = self
            .entries
            .iter()
            .find(|e| e.matches(market, security_type, resolution, bar_type))
            .map(|e| e.verdict);
        match verdict {
            Some(Verdict::Supported) => Ok(()),
            Some(Verdict::Reject(Dimension::Market)) => Err(UnsupportedReason::Market {
                requested: market.clone(),
                home: self.home.clone(),
            }),
            Some(Verdict::Reject(Dimension::SecurityType)) => {
                Err(UnsupportedReason::SecurityType(security_type))
            }
            Some(Verdict::Reject(Dimension::Resolution)) => {
                Err(UnsupportedReason::Resolution(resolution))
            }
            Some(Verdict::Reject(Dimension::DataType)) => Err(UnsupportedReason::DataType(bar_type)),
            None => Err(UnsupportedReason::NoMatchingRule),
        }
    }

    /// Resolve a full request (the time range is not considered here).
    ///
    /// # Errors
    /// See [`SupportMatrix::check`].
    pub fn check_request(&self, req: &HistoryRequest) -> Result<(), UnsupportedReason> {
        self.check(
            req.symbol.market(),
            req.symbol.security_type(),
            req.resolution,
            req.bar_type,
        )
    }

    /// Convenience predicate over [`SupportMatrix::check_request`].
    #[must_use]
    pub fn is_supported(&self, req: &HistoryRequest) -> bool {
        self.check_request(req).is_ok()
    }
}

impl Default for SupportMatrix {
    fn default() -> Self {
        Self::zerodha()
    }
}

/// Builder for [`SupportMatrix`].
#[derive(Debug, Clone)]
pub struct SupportMatrixBuilder {
    home: Market,
    entries: Vec<SupportEntry>,
}

impl SupportMatrixBuilder {
    /// Append a row; rows are evaluated in insertion order.
    #[must_use]
    pub fn rule(mut self, entry: SupportEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Finish the table.
    #[must_use]
    pub fn build(self) -> SupportMatrix {
        SupportMatrix {
            home: self.home,
            entries: self.entries,
        }
    }
}
