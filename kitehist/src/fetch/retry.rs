//! Backoff policy for transient provider failures.

use std::time::Duration;

use kitehist_core::{CandleQuery, KiteError, RawCandle, RetryConfig};
use rand::Rng;

use crate::KiteHist;

/// Add up to `jitter_percent` percent of random jitter to `base_ms`.
#[must_use]
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, (base_ms.saturating_mul(u64::from(jitter_percent))) / 100)
    };
    let mut rng = rand::rng();
    base_ms.saturating_add(rng.random_range(0..jitter_range))
}

/// Delay before retry number `retry` (1-based), honoring a server `Retry-After` hint.
///
/// The jittered delay never exceeds `max_backoff_ms`; a hint may raise it up to
/// `max_retry_after_ms`.
#[must_use]
pub fn backoff_delay(cfg: &RetryConfig, retry: u32, hint_ms: Option<u64>) -> Duration {
    let base = u64::try_from(cfg.base_delay(retry).as_millis()).unwrap_or(u64::MAX);
    let jittered = jitter_wait(base, u32::from(cfg.jitter_percent.min(100))).min(cfg.max_backoff_ms);
    let hint = hint_ms.map_or(0, |h| h.min(cfg.max_retry_after_ms));
    Duration::from_millis(jittered.max(hint))
}

impl KiteHist {
    /// Fetch one window, retrying transient failures.
    ///
    /// Each attempt is bounded by the provider timeout. Permanent failures stop
    /// immediately. When no attempt succeeds the collected failures are returned
    /// as `DataSourceUnavailable` for the window.
    pub(crate) async fn fetch_window(
        &self,
        query: &CandleQuery,
    ) -> Result<Vec<RawCandle>, KiteError> {
        let policy = self.cfg.retry;
        let attempts = policy.max_attempts.max(1);
        let connector = self.provider.name();
        let mut failures = Vec::new();

        for attempt in 1..=attempts {
            let result = Self::provider_call_with_timeout(
                connector,
                "history",
                self.cfg.provider_timeout,
                self.provider.fetch_candles(query),
            )
            .await;
            let err = match result {
                Ok(candles) => return Ok(candles),
                Err(e) => e,
            };
            let retryable = err.is_transient() && attempt < attempts;
            let hint = match &err {
                KiteError::RateLimited { retry_after_ms, .. } => *retry_after_ms,
                _ => None,
            };
            failures.push(err);
            if !retryable {
                break;
            }
            let delay = backoff_delay(&policy, attempt, hint);
            #[cfg(feature = "tracing")]
            tracing::debug!(
                connector,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                from = %query.from,
                "transient failure; retrying window"
            );
            tokio::time::sleep(delay).await;
        }

        Err(KiteError::DataSourceUnavailable {
            from: query.from,
            to: query.to,
            failures,
        })
    }
}
