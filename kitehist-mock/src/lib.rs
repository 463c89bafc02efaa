//! Mock candle provider for CI-safe tests and the CLI's offline mode.
//!
//! Data is synthetic but deterministic: every weekday session bucket of a
//! window gets a candle derived from the ticker and the bucket time. Tickers
//! with special names trigger canned behaviors:
//!
//! - `FAIL`: every call fails with a permanent connector error.
//! - `HANG`: every call blocks forever (exercises timeouts).
//! - `EMPTY`: every call returns no candles.
//! - `THROTTLED`: every call is rate limited (transient).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kitehist_core::{CandleProvider, CandleQuery, KiteError, RawCandle};

mod fixtures;

pub use fixtures::{candle_at, session_candles};

const NAME: &str = "kitehist-mock";

/// Instruction for how calls for a given ticker should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return these candles for every window.
    Return(Vec<RawCandle>),
    /// Fail immediately with the provided error.
    Fail(KiteError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct Injected {
    rules: HashMap<String, MockBehavior>,
    failing_windows: HashSet<DateTime<Utc>>,
    malformed_at: HashSet<DateTime<Utc>>,
}

/// Deterministic provider with failure injection and a call log.
pub struct MockProvider {
    latency: Option<Duration>,
    flaky_remaining: AtomicU32,
    injected: Mutex<Injected>,
    calls: Mutex<Vec<CandleQuery>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Provider returning synthetic session candles.
    #[must_use]
    pub fn new() -> Self {
        Self {
            latency: None,
            flaky_remaining: AtomicU32::new(0),
            injected: Mutex::new(Injected::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before answering each call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `n` calls with a transient server error.
    #[must_use]
    pub fn with_flaky_calls(self, n: u32) -> Self {
        self.flaky_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Permanently fail any window starting at `start`.
    #[must_use]
    pub fn with_failing_window(self, start: DateTime<Utc>) -> Self {
        self.lock_injected().failing_windows.insert(start);
        self
    }

    /// Replace the candle at `t` with one carrying a non-finite price.
    #[must_use]
    pub fn with_malformed_at(self, t: DateTime<Utc>) -> Self {
        self.lock_injected().malformed_at.insert(t);
        self
    }

    /// Set the behavior for calls on `ticker` (case-insensitive).
    pub fn set_behavior(&self, ticker: &str, behavior: MockBehavior) {
        self.lock_injected()
            .rules
            .insert(ticker.to_ascii_uppercase(), behavior);
    }

    /// Clear all per-ticker behaviors and the call log.
    pub fn reset(&self) {
        self.lock_injected().rules.clear();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Queries received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<CandleQuery> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of queries received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_injected(&self) -> std::sync::MutexGuard<'_, Injected> {
        self.injected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_flaky(&self) -> bool {
        self.flaky_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn builtin(ticker: &str) -> Option<MockBehavior> {
        match ticker {
            "FAIL" => Some(MockBehavior::Fail(KiteError::connector(
                NAME,
                "forced failure: history",
            ))),
            "HANG" => Some(MockBehavior::Hang),
            "EMPTY" => Some(MockBehavior::Return(Vec::new())),
            "THROTTLED" => Some(MockBehavior::Fail(KiteError::RateLimited {
                connector: NAME.to_string(),
                retry_after_ms: None,
            })),
            _ => None,
        }
    }
}

#[async_trait]
impl CandleProvider for MockProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let ticker = query.symbol.ticker();
        // Snapshot behavior without holding the lock across await points
        let (behavior, window_fails, malformed) = {
            let guard = self.lock_injected();
            (
                guard.rules.get(ticker).cloned(),
                guard.failing_windows.contains(&query.from),
                guard.malformed_at.clone(),
            )
        };

        match behavior.or_else(|| Self::builtin(ticker)) {
            Some(MockBehavior::Return(candles)) => return Ok(candles),
            Some(MockBehavior::Fail(e)) => return Err(e),
            Some(MockBehavior::Hang) => return std::future::pending().await,
            None => {}
        }

        if window_fails {
            return Err(KiteError::connector(
                NAME,
                format!("forced window failure at {}", query.from),
            ));
        }
        if self.take_flaky() {
            return Err(KiteError::Server {
                connector: NAME.to_string(),
                status: 503,
                msg: "flaky".into(),
            });
        }

        let mut candles = session_candles(
            ticker,
            query.resolution,
            query.exchange_tz,
            query.from,
            query.to,
        );
        for c in &mut candles {
            if malformed.contains(&c.time.with_timezone(&Utc)) {
                c.high = f64::NAN;
            }
        }
        Ok(candles)
    }
}
