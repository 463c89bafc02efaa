use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BarType, Market, Resolution, SecurityType};

/// Why a history request cannot be served by the broker.
///
/// This is a normal, expected outcome rather than a failure: callers receive it
/// through [`HistoryOutcome::Unsupported`](crate::HistoryOutcome::Unsupported).
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnsupportedReason {
    /// The instrument is listed outside the broker's home market.
    #[error("unsupported market: {requested} (broker serves {home})")]
    Market {
        /// Market named by the request.
        requested: Market,
        /// The broker's home market.
        home: Market,
    },

    /// The broker does not serve history for this security type.
    #[error("unsupported security type: {0}")]
    SecurityType(SecurityType),

    /// The broker does not expose history at this granularity.
    #[error("unsupported resolution: {0}")]
    Resolution(Resolution),

    /// The broker does not provide this bar shape.
    #[error("unsupported data type: {0}")]
    DataType(BarType),

    /// The requested interval is empty or inverted.
    #[error("invalid range: start {start} is not before end {end}")]
    InvalidRange {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// No entry of the support table matched the request.
    #[error("no support rule matches this request")]
    NoMatchingRule,
}

/// Unified error type for the kitehist workspace.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KiteError {
    /// The request or capability is not servable by the target connector.
    #[error("unsupported request: {0}")]
    Unsupported(UnsupportedReason),

    /// Issues with the returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A single broker record violated bar invariants and was dropped.
    #[error("malformed record at {time:?}: {reason}")]
    MalformedRecord {
        /// Record timestamp when it could be parsed.
        time: Option<DateTime<Utc>>,
        /// What was wrong with the record.
        reason: String,
    },

    /// The broker throttled the call.
    #[error("rate limited by {connector}")]
    RateLimited {
        /// Connector name that was throttled.
        connector: String,
        /// Server hint for when to retry, if any.
        retry_after_ms: Option<u64>,
    },

    /// The broker answered with a 5xx-class error.
    #[error("{connector} server error {status}: {msg}")]
    Server {
        /// Connector name.
        connector: String,
        /// HTTP status code.
        status: u16,
        /// Body or reason.
        msg: String,
    },

    /// The broker answered with a non-retryable HTTP status.
    #[error("{connector} http error {status}: {msg}")]
    Http {
        /// Connector name.
        connector: String,
        /// HTTP status code.
        status: u16,
        /// Body or reason.
        msg: String,
    },

    /// The connection could not be established or was reset.
    #[error("{connector} transport error: {msg}")]
    Transport {
        /// Connector name.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "instrument token for SBIN".
        what: String,
    },

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {capability} via {connector}")]
    ProviderTimeout {
        /// Connector name that timed out.
        connector: String,
        /// Capability label (e.g. "history").
        capability: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Capability label for which the request timed out.
        capability: String,
    },

    /// Every retry for the window `[from, to]` failed.
    #[error("data source unavailable for {from}..{to}: {failures:?}")]
    DataSourceUnavailable {
        /// Window start.
        from: DateTime<Utc>,
        /// Window end.
        to: DateTime<Utc>,
        /// Errors seen for the window, in attempt order.
        failures: Vec<KiteError>,
    },

    /// The fetch was cancelled by the caller.
    #[error("fetch cancelled")]
    Cancelled,

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl KiteError {
    /// Helper: build an `Unsupported` error from a reason.
    #[must_use]
    pub const fn unsupported(reason: UnsupportedReason) -> Self {
        Self::Unsupported(reason)
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Helper: build a `MalformedRecord` error.
    pub fn malformed(time: Option<DateTime<Utc>>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            time,
            reason: reason.into(),
        }
    }

    /// Returns true for failures worth retrying: timeouts, throttling, 5xx and transport faults.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Server { .. }
                | Self::Transport { .. }
                | Self::ProviderTimeout { .. }
        )
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Unsupported requests, dropped records and caller cancellation are expected
    /// outcomes. Aggregates are classified based on their contents.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Unsupported(_) | Self::MalformedRecord { .. } | Self::Cancelled => false,
            Self::DataSourceUnavailable { failures, .. } => {
                failures.is_empty() || failures.iter().any(Self::is_actionable)
            }
            _ => true,
        }
    }

    /// Flatten nested `DataSourceUnavailable` structures into their underlying failures.
    ///
    /// Other variants are preserved as-is.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::DataSourceUnavailable { failures, .. } if !failures.is_empty() => {
                failures.into_iter().flat_map(Self::flatten).collect()
            }
            other => vec![other],
        }
    }
}

impl From<UnsupportedReason> for KiteError {
    fn from(reason: UnsupportedReason) -> Self {
        Self::Unsupported(reason)
    }
}
