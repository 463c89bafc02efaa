use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use kitehist::{HistoryRequest, RateLimitConfig, Resolution, ResolutionMapper};
use kitehist_mock::MockProvider;
use tokio::time::Instant;

use crate::helpers::{builder_with, equity, ist};

#[tokio::test(start_paused = true)]
async fn window_calls_respect_kite_rate() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock.clone())
        .rate_limit(RateLimitConfig::kite())
        .resolution_mapper(
            ResolutionMapper::kite().with_max_span(Resolution::Minute, TimeDelta::minutes(30)),
        )
        .build()
        .unwrap();
    let req = HistoryRequest::new(
        equity("SBIN"),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 12, 15),
    );

    let t0 = Instant::now();
    let resp = kh.history_opt(req).await.unwrap().unwrap();
    let elapsed = t0.elapsed();

    assert_eq!(mock.call_count(), 6);
    assert_eq!(resp.len(), 181);
    // six calls at three per second need one full window of waiting
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn unthrottled_fetch_does_not_wait() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock)
        .resolution_mapper(
            ResolutionMapper::kite().with_max_span(Resolution::Minute, TimeDelta::minutes(30)),
        )
        .build()
        .unwrap();
    let req = HistoryRequest::new(
        equity("SBIN"),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 12, 15),
    );
    let t0 = Instant::now();
    kh.history_opt(req).await.unwrap().unwrap();
    assert_eq!(t0.elapsed(), Duration::ZERO);
}
