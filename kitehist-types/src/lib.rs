//! Kitehist data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod bar;
mod config;
mod error;
mod reports;
mod request;
mod symbol;

pub use bar::Bar;
pub use config::{FetchConfig, RateLimitConfig, RetryConfig};
pub use error::{KiteError, UnsupportedReason};
pub use reports::{DownloadEntry, DownloadReport, HistoryOutcome, HistoryResponse};
pub use request::{
    BarType, DataNormalizationMode, HistoryRequest, Resolution, TickType, lookback_start,
};
pub use symbol::{Market, SecurityType, Symbol};
