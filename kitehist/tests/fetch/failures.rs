use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use kitehist::{
    CandleProvider, CandleQuery, HistoryOutcome, HistoryRequest, KiteError, RawCandle, Resolution,
    ResolutionMapper, RetryConfig,
};
use kitehist_mock::MockProvider;
use tokio::time::Instant;

use crate::helpers::{builder_with, equity, ist, kite_with};

fn morning(ticker: &str) -> HistoryRequest {
    HistoryRequest::new(
        equity(ticker),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 11, 15),
    )
}

fn short(ticker: &str) -> HistoryRequest {
    HistoryRequest::new(
        equity(ticker),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 9, 30),
    )
}

fn windows() -> ResolutionMapper {
    ResolutionMapper::kite().with_max_span(Resolution::Minute, TimeDelta::minutes(30))
}

#[tokio::test]
async fn interior_window_failure_yields_partial_bars() {
    let mock = Arc::new(MockProvider::new().with_failing_window(ist(2024, 6, 5, 9, 45)));
    let kh = builder_with(mock.clone())
        .resolution_mapper(windows())
        .build()
        .unwrap();

    let HistoryOutcome::Supported(resp) = kh.history(morning("SBIN")).await else {
        panic!("expected partial success");
    };
    assert!(resp.is_partial());
    assert_eq!(resp.len(), 31 + 61);
    assert!(
        !resp
            .iter()
            .any(|b| b.time > ist(2024, 6, 5, 9, 45) && b.time < ist(2024, 6, 5, 10, 15))
    );
    assert_eq!(resp.warnings.len(), 1);
    match &resp.warnings[0] {
        KiteError::DataSourceUnavailable { from, to, failures } => {
            assert_eq!(*from, ist(2024, 6, 5, 9, 45));
            assert_eq!(*to, ist(2024, 6, 5, 10, 15));
            assert_eq!(failures.len(), 1, "permanent failures are not retried");
        }
        other => panic!("unexpected warning: {other:?}"),
    }
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn single_window_permanent_failure_fails() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let err = kh.history_opt(short("FAIL")).await.unwrap_err();
    match err {
        KiteError::DataSourceUnavailable { failures, .. } => {
            assert!(matches!(failures[..], [KiteError::Connector { .. }]));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn every_window_failing_aggregates_per_window_errors() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock)
        .resolution_mapper(windows())
        .build()
        .unwrap();
    let HistoryOutcome::Failed(err) = kh.history(morning("FAIL")).await else {
        panic!("expected failure");
    };
    assert!(matches!(err, KiteError::DataSourceUnavailable { .. }));
    let flat = err.flatten();
    assert_eq!(flat.len(), 4);
    assert!(flat.iter().all(|e| matches!(e, KiteError::Connector { .. })));
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let mock = Arc::new(MockProvider::new().with_flaky_calls(2));
    let kh = kite_with(mock.clone());
    let resp = kh.history_opt(short("SBIN")).await.unwrap().unwrap();
    assert_eq!(resp.len(), 16);
    assert!(resp.warnings.is_empty());
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let err = kh.history_opt(short("THROTTLED")).await.unwrap_err();
    match err {
        KiteError::DataSourceUnavailable { failures, .. } => {
            assert_eq!(failures.len(), 3);
            assert!(failures.iter().all(KiteError::is_transient));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_provider_times_out_per_call() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock.clone())
        .provider_timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let err = kh.history_opt(short("HANG")).await.unwrap_err();
    let flat = err.flatten();
    assert_eq!(flat.len(), 3);
    assert!(
        flat.iter()
            .all(|e| matches!(e, KiteError::ProviderTimeout { connector, .. } if connector == "kitehist-mock"))
    );
}

#[tokio::test(start_paused = true)]
async fn request_deadline_bounds_whole_fetch() {
    let mock = Arc::new(MockProvider::new().with_latency(Duration::from_secs(1)));
    let kh = builder_with(mock)
        .resolution_mapper(windows())
        .request_timeout(Duration::from_millis(2_500))
        .build()
        .unwrap();
    let outcome = kh.history(morning("SBIN")).await;
    assert!(matches!(
        outcome,
        HistoryOutcome::Failed(KiteError::RequestTimeout { .. })
    ));
}

#[tokio::test]
async fn malformed_candles_are_dropped_with_warning() {
    let bad = ist(2024, 6, 5, 9, 20);
    let mock = Arc::new(MockProvider::new().with_malformed_at(bad));
    let kh = kite_with(mock);
    let resp = kh.history_opt(short("SBIN")).await.unwrap().unwrap();
    assert_eq!(resp.len(), 15);
    assert!(!resp.iter().any(|b| b.time == bad));
    assert!(!resp.is_partial());
    assert!(matches!(
        resp.warnings[..],
        [KiteError::MalformedRecord { time: Some(t), .. }] if t == bad
    ));
}

/// Throttles the first call with a day-long `Retry-After`, then delegates.
struct DayLongRetryAfter {
    inner: MockProvider,
    throttled: AtomicBool,
}

#[async_trait]
impl CandleProvider for DayLongRetryAfter {
    fn name(&self) -> &'static str {
        "day-long-retry-after"
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        if !self.throttled.swap(true, Ordering::SeqCst) {
            return Err(KiteError::RateLimited {
                connector: self.name().to_string(),
                retry_after_ms: Some(86_400_000),
            });
        }
        self.inner.fetch_candles(query).await
    }
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_is_capped() {
    let kh = kitehist::KiteHist::builder()
        .with_provider(Arc::new(DayLongRetryAfter {
            inner: MockProvider::new(),
            throttled: AtomicBool::new(false),
        }))
        .retry(RetryConfig::default())
        .build()
        .unwrap();
    let t0 = Instant::now();
    let resp = kh.history_opt(short("SBIN")).await.unwrap().unwrap();
    let elapsed = t0.elapsed();
    assert_eq!(resp.len(), 16);
    assert!(elapsed >= Duration::from_millis(30_000));
    assert!(elapsed < Duration::from_secs(31));
}
