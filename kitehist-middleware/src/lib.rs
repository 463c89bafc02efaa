//! kitehist-middleware
//!
//! Wrappers applied around a `CandleProvider` before the orchestrator uses it.

mod rate_limit;

pub use crate::rate_limit::{RateLimitMiddleware, RateLimitedProvider, RateLimiter};
