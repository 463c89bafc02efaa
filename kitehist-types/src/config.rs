//! Configuration types shared by the orchestrator and connectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff with jitter applied to transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per window, including the first (>= 1).
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub min_backoff_ms: u64,
    /// Upper bound for any single delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
    /// Ceiling applied to a server `Retry-After` hint in milliseconds.
    #[serde(default = "default_max_retry_after_ms")]
    pub max_retry_after_ms: u64,
}

const fn default_max_retry_after_ms() -> u64 {
    30_000
}

impl RetryConfig {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            min_backoff_ms: 0,
            max_backoff_ms: 0,
            factor: 1,
            jitter_percent: 0,
            max_retry_after_ms: 0,
        }
    }

    /// Base delay before retry number `retry` (1-based), before jitter.
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1);
        let mult = u64::from(self.factor.max(1)).saturating_pow(exp);
        let ms = self
            .min_backoff_ms
            .saturating_mul(mult)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_ms: 200,
            max_backoff_ms: 5_000,
            factor: 2,
            jitter_percent: 20,
            max_retry_after_ms: default_max_retry_after_ms(),
        }
    }
}

/// Sliding-window budget for outbound broker calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum calls admitted within one window.
    pub limit: u32,
    /// Length of the sliding window.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Kite Connect historical endpoint budget: three requests per second.
    #[must_use]
    pub const fn kite() -> Self {
        Self {
            limit: 3,
            window: Duration::from_secs(1),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::kite()
    }
}

/// Global configuration for the `KiteHist` orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for each individual provider call.
    pub provider_timeout: Duration,
    /// Optional deadline for a whole fetch across all windows.
    pub request_timeout: Option<Duration>,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
    /// On cancellation, return the bars fetched so far instead of failing.
    pub partial_on_cancel: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            request_timeout: None,
            retry: RetryConfig::default(),
            partial_on_cancel: false,
        }
    }
}
