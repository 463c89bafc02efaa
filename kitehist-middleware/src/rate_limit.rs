//! Sliding-window limiter for outbound broker calls.
//!
//! Callers over budget are delayed, never rejected: [`RateLimiter::acquire`]
//! sleeps until the oldest grant leaves the window. Waiters are served in
//! arrival order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use kitehist_core::{CandleProvider, CandleQuery, Middleware, RawCandle};
use kitehist_types::{KiteError, RateLimitConfig};
use tokio::time::Instant;

/// Shared admission control: at most `limit` grants within any `window`.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    grants: Mutex<VecDeque<Instant>>,
    turn: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    /// Create a limiter; a zero limit is treated as one.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let config = RateLimitConfig {
            limit: config.limit.max(1),
            ..config
        };
        Self {
            grants: Mutex::new(VecDeque::with_capacity(config.limit as usize)),
            turn: tokio::sync::Mutex::new(()),
            config,
        }
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Take a grant now, or report how long until one frees up.
    ///
    /// Never jumps ahead of callers already waiting in [`RateLimiter::acquire`].
    ///
    /// # Errors
    /// Returns the wait duration when the window is full or others are queued.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        match self.turn.try_lock() {
            Ok(_turn) => self.take(true),
            Err(_) => Err(self.take(false).err().unwrap_or(Duration::ZERO)),
        }
    }

    fn take(&self, commit: bool) -> Result<(), Duration> {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let window = self.config.window;
        while grants
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            grants.pop_front();
        }
        if grants.len() < self.config.limit as usize {
            if commit {
                grants.push_back(now);
            }
            return Ok(());
        }
        let oldest = grants.front().copied().unwrap_or(now);
        Err(window.saturating_sub(now.duration_since(oldest)))
    }

    /// Wait until a grant is available and take it.
    pub async fn acquire(&self) {
        let _turn = self.turn.lock().await;
        loop {
            match self.take(true) {
                Ok(()) => return,
                Err(wait) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "rate limiter full; waiting"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Grants currently counted against the window.
    #[must_use]
    pub fn in_window(&self) -> usize {
        let grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        grants
            .iter()
            .filter(|t| now.duration_since(**t) < self.config.window)
            .count()
    }
}

/// Provider wrapper that takes a limiter grant before every call.
pub struct RateLimitedProvider {
    inner: Arc<dyn CandleProvider>,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedProvider {
    /// Wrap `inner` with a shared limiter.
    pub fn new(inner: Arc<dyn CandleProvider>, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// Access the inner provider.
    pub fn inner(&self) -> &Arc<dyn CandleProvider> {
        &self.inner
    }

    /// Access the limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl CandleProvider for RateLimitedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        self.limiter.acquire().await;
        self.inner.fetch_candles(query).await
    }
}

/// Middleware config for constructing a [`RateLimitedProvider`].
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    /// Middleware with its own limiter.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(config)),
        }
    }

    /// Middleware reusing a limiter shared with other providers.
    #[must_use]
    pub const fn shared(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Middleware for RateLimitMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn CandleProvider>) -> Arc<dyn CandleProvider> {
        Arc::new(RateLimitedProvider::new(inner, self.limiter))
    }

    fn name(&self) -> &'static str {
        "RateLimitedProvider"
    }

    fn config_json(&self) -> serde_json::Value {
        let cfg = self.limiter.config();
        serde_json::json!({
            "limit": cfg.limit,
            "window_ms": u64::try_from(cfg.window.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
