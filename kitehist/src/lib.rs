//! kitehist fetches historical price bars from Zerodha Kite Connect.
//!
//! Overview
//! - A declarative support table decides whether a request is servable at all;
//!   unsupported requests return [`HistoryOutcome::Unsupported`] without any broker call.
//! - Ranges longer than the broker's per-call lookback are split into windows
//!   that are fetched sequentially, stitched, deduplicated and normalized.
//! - Transient failures are retried with exponential backoff and jitter; a window
//!   that keeps failing becomes a `DataSourceUnavailable` warning and the other
//!   windows still contribute bars.
//! - Every provider call is bounded by a timeout, and an optional request-level
//!   deadline bounds the whole fetch.
//! - Outbound calls can be throttled by a shared sliding-window rate limiter.
//!
//! Fetching history:
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::{TimeDelta, Utc};
//! use kitehist::{HistoryOutcome, HistoryRequest, KiteHist, RateLimitConfig, Resolution, Symbol};
//! use kitehist_zerodha::ZerodhaConnector;
//!
//! let zerodha = ZerodhaConnector::builder()
//!     .credentials(api_key, access_token)
//!     .rate_limit(RateLimitConfig::kite())
//!     .build()?;
//! let kh = KiteHist::builder().with_provider(Arc::new(zerodha)).build()?;
//!
//! let req = HistoryRequest::lookback(
//!     Symbol::india_equity("SBIN")?,
//!     Resolution::Minute,
//!     Utc::now(),
//!     TimeDelta::hours(1),
//! );
//! match kh.history(req).await {
//!     HistoryOutcome::Supported(resp) => {
//!         for bar in &resp {
//!             println!("{} {}", bar.time, bar.close);
//!         }
//!     }
//!     HistoryOutcome::Unsupported(reason) => eprintln!("skipped: {reason}"),
//!     HistoryOutcome::Failed(e) => return Err(e),
//! }
//! ```
//!
//! Bulk download helper (multi-symbol history):
//! ```rust,ignore
//! let report = kh
//!     .download()
//!     .symbols(&[Symbol::india_equity("SBIN")?, Symbol::india_equity("INFY")?])?
//!     .resolution(Resolution::Daily)
//!     .lookback(Utc::now(), TimeDelta::days(30))
//!     .run()
//!     .await?;
//! for (symbol, resp) in report.supported() {
//!     println!("{symbol}: {} bars", resp.len());
//! }
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod fetch;

/// Cooperative cancellation shared between a caller and running fetches.
///
/// The fetcher checks the token before each window; a call already in flight
/// is allowed to finish. Child tokens are cancelled with their parent.
pub use tokio_util::sync::CancellationToken as CancelToken;
pub use crate::core::{KiteHist, KiteHistBuilder, MiddlewareDescriptor};
pub use fetch::download::DownloadBuilder;
pub use fetch::retry::{backoff_delay, jitter_wait};
pub use fetch::util::join_with_deadline;

pub use kitehist_middleware::{RateLimitMiddleware, RateLimitedProvider, RateLimiter};

// Re-export core types for convenience
pub use kitehist_core::{
    Bar, BarType, CandleProvider, CandleQuery, DataNormalizationMode, DownloadEntry,
    DownloadReport, FetchConfig, HistoryOutcome, HistoryRequest, HistoryResponse, KiteError,
    Market, Middleware, PaginationPlan, RateLimitConfig, RawCandle, Resolution, ResolutionMapper,
    RetryConfig, SecurityType, SupportMatrix, Symbol, TickType, UnsupportedReason, Window,
};
