use std::sync::Arc;
use std::time::Duration;

use kitehist::{
    FetchConfig, KiteError, KiteHist, RateLimitConfig, RetryConfig, SupportMatrix,
};
use kitehist_mock::MockProvider;

use crate::helpers::builder_with;

#[test]
fn build_requires_provider() {
    let err = KiteHist::builder().build().err().unwrap();
    assert!(matches!(err, KiteError::InvalidArg(msg) if msg.contains("no provider")));
}

#[test]
fn defaults_follow_zerodha() {
    let kh = KiteHist::builder()
        .with_provider(Arc::new(MockProvider::new()))
        .build()
        .unwrap();
    assert_eq!(kh.config(), &FetchConfig::default());
    assert_eq!(kh.support_matrix().home_market().as_str(), "india");
    assert!(kh.middleware().is_empty());
}

#[test]
fn setters_update_config() {
    let kh = builder_with(Arc::new(MockProvider::new()))
        .provider_timeout(Duration::from_millis(750))
        .request_timeout(Duration::from_secs(30))
        .retry(RetryConfig::none())
        .partial_on_cancel(true)
        .build()
        .unwrap();
    let cfg = kh.config();
    assert_eq!(cfg.provider_timeout, Duration::from_millis(750));
    assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
    assert_eq!(cfg.retry.max_attempts, 1);
    assert!(cfg.partial_on_cancel);
}

#[test]
fn middleware_descriptors_keep_registration_order() {
    let kh = builder_with(Arc::new(MockProvider::new()))
        .rate_limit(RateLimitConfig::kite())
        .rate_limit(RateLimitConfig {
            limit: 10,
            window: Duration::from_secs(60),
        })
        .build()
        .unwrap();
    let layers = kh.middleware();
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|(name, _)| *name == "RateLimitedProvider"));
    assert_eq!(layers[0].1["limit"], 3);
    assert_eq!(layers[1].1["limit"], 10);
    assert_eq!(layers[1].1["window_ms"], 60_000);
}

#[test]
fn custom_matrix_replaces_default() {
    let kh = builder_with(Arc::new(MockProvider::new()))
        .support_matrix(SupportMatrix::builder(kitehist::Market::usa()).build())
        .build()
        .unwrap();
    assert_eq!(kh.support_matrix().home_market().as_str(), "usa");
}
