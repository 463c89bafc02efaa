use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use kitehist::{
    CancelToken, CandleProvider, CandleQuery, HistoryOutcome, HistoryRequest, KiteError, KiteHist,
    RawCandle, Resolution, ResolutionMapper,
};
use kitehist_mock::MockProvider;

use crate::helpers::{equity, fast_retry, ist, kite_with};

/// Delegates to the mock and trips the token after answering the first call.
struct CancelAfterFirst {
    inner: Arc<MockProvider>,
    token: CancelToken,
}

#[async_trait]
impl CandleProvider for CancelAfterFirst {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        let out = self.inner.fetch_candles(query).await;
        self.token.cancel();
        out
    }
}

fn morning() -> HistoryRequest {
    HistoryRequest::new(
        equity("SBIN"),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 11, 15),
    )
}

fn cancelling_kite(partial: bool) -> (KiteHist, Arc<MockProvider>, CancelToken) {
    let mock = Arc::new(MockProvider::new());
    let token = CancelToken::new();
    let kh = KiteHist::builder()
        .with_provider(Arc::new(CancelAfterFirst {
            inner: mock.clone(),
            token: token.clone(),
        }))
        .resolution_mapper(
            ResolutionMapper::kite().with_max_span(Resolution::Minute, TimeDelta::minutes(30)),
        )
        .retry(fast_retry(1))
        .partial_on_cancel(partial)
        .build()
        .unwrap();
    (kh, mock, token)
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let token = CancelToken::new();
    token.cancel();
    let outcome = kh.history_with_cancel(morning(), &token).await;
    assert!(matches!(outcome, HistoryOutcome::Failed(KiteError::Cancelled)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn cancellation_discards_fetched_bars_by_default() {
    let (kh, mock, token) = cancelling_kite(false);
    let outcome = kh.history_with_cancel(morning(), &token).await;
    assert!(matches!(outcome, HistoryOutcome::Failed(KiteError::Cancelled)));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn partial_on_cancel_keeps_completed_windows() {
    let (kh, mock, token) = cancelling_kite(true);
    let HistoryOutcome::Supported(resp) = kh.history_with_cancel(morning(), &token).await else {
        panic!("expected partial bars");
    };
    assert_eq!(mock.call_count(), 1);
    // first window is 09:15..=09:45
    assert_eq!(resp.len(), 31);
    assert!(resp.is_partial());
    assert!(matches!(resp.warnings[..], [KiteError::Cancelled]));
}

#[tokio::test]
async fn unsupported_wins_over_cancellation() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock);
    let token = CancelToken::new();
    token.cancel();
    let req = HistoryRequest::new(
        equity("SBIN"),
        Resolution::Tick,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 9, 30),
    );
    assert!(kh.history_with_cancel(req, &token).await.is_unsupported());
}

#[tokio::test]
async fn cancelling_parent_stops_child_fetches() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let parent = CancelToken::new();
    let child = parent.child_token();
    parent.cancel();
    let outcome = kh.history_with_cancel(morning(), &child).await;
    assert!(matches!(outcome, HistoryOutcome::Failed(KiteError::Cancelled)));
    assert_eq!(mock.call_count(), 0);
}
