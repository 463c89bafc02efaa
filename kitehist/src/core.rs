use std::sync::Arc;
use std::time::Duration;

use kitehist_core::{
    CandleProvider, FetchConfig, KiteError, Middleware, RateLimitConfig, ResolutionMapper,
    RetryConfig, SupportMatrix,
};
use kitehist_middleware::RateLimitMiddleware;

/// Name and configuration snapshot of an applied middleware layer.
pub type MiddlewareDescriptor = (&'static str, serde_json::Value);

/// Orchestrator that gates, paginates and fetches history through one provider.
pub struct KiteHist {
    pub(crate) provider: Arc<dyn CandleProvider>,
    pub(crate) matrix: SupportMatrix,
    pub(crate) mapper: ResolutionMapper,
    pub(crate) cfg: FetchConfig,
    pub(crate) layers: Vec<MiddlewareDescriptor>,
}

/// Builder for constructing a `KiteHist` orchestrator with custom configuration.
pub struct KiteHistBuilder {
    provider: Option<Arc<dyn CandleProvider>>,
    middleware: Vec<Box<dyn Middleware>>,
    matrix: SupportMatrix,
    mapper: ResolutionMapper,
    cfg: FetchConfig,
}

impl Default for KiteHistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KiteHistBuilder {
    /// Create a new builder with Zerodha defaults.
    ///
    /// Starts with no provider, the Zerodha support table, Kite interval caps,
    /// a 10s provider timeout and three attempts per window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: None,
            middleware: Vec::new(),
            matrix: SupportMatrix::zerodha(),
            mapper: ResolutionMapper::kite(),
            cfg: FetchConfig::default(),
        }
    }

    /// Set the candle provider. A later call replaces an earlier one.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn CandleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a middleware layer. Layers are applied in registration order, so the
    /// last one registered is outermost.
    #[must_use]
    pub fn with_middleware(mut self, layer: Box<dyn Middleware>) -> Self {
        self.middleware.push(layer);
        self
    }

    /// Throttle outbound calls with a dedicated sliding-window limiter.
    #[must_use]
    pub fn rate_limit(self, cfg: RateLimitConfig) -> Self {
        self.with_middleware(Box::new(RateLimitMiddleware::new(cfg)))
    }

    /// Replace the support table.
    #[must_use]
    pub fn support_matrix(mut self, matrix: SupportMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// Replace the resolution mapper.
    #[must_use]
    pub fn resolution_mapper(mut self, mapper: ResolutionMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Replace the whole fetch configuration.
    #[must_use]
    pub const fn config(mut self, cfg: FetchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the per-call provider timeout.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Bound a whole fetch (all windows and retries).
    ///
    /// When exceeded, the outcome is `Failed(RequestTimeout)`.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Set the retry policy for transient failures.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.cfg.retry = retry;
        self
    }

    /// Return partial bars instead of failing when a fetch is cancelled.
    #[must_use]
    pub const fn partial_on_cancel(mut self, yes: bool) -> Self {
        self.cfg.partial_on_cancel = yes;
        self
    }

    /// Build the `KiteHist` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no provider has been set via [`KiteHistBuilder::with_provider`].
    pub fn build(self) -> Result<KiteHist, KiteError> {
        let Some(mut provider) = self.provider else {
            return Err(KiteError::InvalidArg(
                "no provider registered; add one via with_provider(...)".to_string(),
            ));
        };
        let mut layers = Vec::with_capacity(self.middleware.len());
        for layer in self.middleware {
            layers.push((layer.name(), layer.config_json()));
            provider = layer.apply(provider);
        }
        Ok(KiteHist {
            provider,
            matrix: self.matrix,
            mapper: self.mapper,
            cfg: self.cfg,
            layers,
        })
    }
}

impl KiteHist {
    /// Start building a new `KiteHist` instance.
    #[must_use]
    pub fn builder() -> KiteHistBuilder {
        KiteHistBuilder::new()
    }

    /// Effective fetch configuration.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.cfg
    }

    /// Support table used to gate requests.
    #[must_use]
    pub const fn support_matrix(&self) -> &SupportMatrix {
        &self.matrix
    }

    /// Applied middleware layers, innermost first.
    #[must_use]
    pub fn middleware(&self) -> &[MiddlewareDescriptor] {
        &self.layers
    }

    /// Wrap a provider future with a timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kitehist::core::provider_call_with_timeout",
            skip(fut),
            fields(
                connector = connector_name,
                capability = capability,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, KiteError>
    where
        Fut: core::future::Future<Output = Result<T, KiteError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(KiteError::provider_timeout(connector_name, capability)))
    }
}

/// Run `fut` under an optional deadline, mapping expiry to `RequestTimeout("request")`.
pub(crate) async fn with_request_deadline<T, Fut>(
    deadline: Option<Duration>,
    fut: Fut,
) -> Result<T, KiteError>
where
    Fut: core::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| KiteError::request_timeout("request")),
        None => Ok(fut.await),
    }
}
