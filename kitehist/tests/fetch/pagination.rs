use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::TimeDelta;
use kitehist::{
    CandleProvider, CandleQuery, HistoryOutcome, HistoryRequest, KiteError, KiteHist, RawCandle,
    Resolution, ResolutionMapper,
};
use kitehist_mock::MockProvider;
use rust_decimal::Decimal;

use crate::helpers::{builder_with, equity, fast_retry, ist};

fn thirty_minute_windows() -> ResolutionMapper {
    ResolutionMapper::kite().with_max_span(Resolution::Minute, TimeDelta::minutes(30))
}

#[tokio::test]
async fn boundaries_are_fetched_once_and_deduplicated() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock.clone())
        .resolution_mapper(thirty_minute_windows())
        .build()
        .unwrap();
    let req = HistoryRequest::new(
        equity("SBIN"),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 11, 15),
    );

    let plan = kh.plan(&req).unwrap();
    assert_eq!(plan.len(), 4);

    let resp = kh.history_opt(req).await.unwrap().unwrap();
    assert_eq!(resp.len(), 121);
    assert!(resp.warnings.is_empty());
    for pair in resp.bars.windows(2) {
        assert_eq!(pair[1].time - pair[0].time, TimeDelta::minutes(1));
    }

    let calls = mock.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|q| q.interval == "minute"));
    for pair in calls.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
    assert_eq!(calls[0].from, ist(2024, 6, 5, 9, 15));
    assert_eq!(calls[3].to, ist(2024, 6, 5, 11, 15));
}

#[tokio::test]
async fn year_of_minutes_uses_kite_lookback_cap() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock.clone()).build().unwrap();
    let end = ist(2024, 6, 5, 15, 30);
    let req = HistoryRequest::new(
        equity("TCS"),
        Resolution::Minute,
        end - TimeDelta::days(365),
        end,
    );
    let resp = kh.history_opt(req).await.unwrap().unwrap();
    assert_eq!(mock.call_count(), 7);
    assert!(mock.calls().iter().all(|q| q.to - q.from <= TimeDelta::days(60)));
    for pair in resp.bars.windows(2) {
        assert!(pair[0].time < pair[1].time);
    }
}

#[tokio::test]
async fn hourly_and_daily_use_their_interval_tokens() {
    let mock = Arc::new(MockProvider::new());
    let kh = builder_with(mock.clone()).build().unwrap();
    let end = ist(2024, 6, 5, 15, 30);
    let _ = kh
        .history(HistoryRequest::new(
            equity("TCS"),
            Resolution::Hour,
            end - TimeDelta::days(3),
            end,
        ))
        .await;
    let _ = kh
        .history(HistoryRequest::new(
            equity("TCS"),
            Resolution::Daily,
            end - TimeDelta::days(3),
            end,
        ))
        .await;
    let intervals: Vec<&str> = mock.calls().iter().map(|q| q.interval).collect();
    assert_eq!(intervals, vec!["60minute", "day"]);
}

/// Returns candles at both window edges, stamping each with the call number.
struct EdgeProvider {
    calls: AtomicU32,
}

#[async_trait]
impl CandleProvider for EdgeProvider {
    fn name(&self) -> &'static str {
        "edge"
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<RawCandle>, KiteError> {
        let n = f64::from(self.calls.fetch_add(1, Ordering::SeqCst) + 1);
        let mk = |t: chrono::DateTime<chrono::Utc>| RawCandle {
            time: t.fixed_offset(),
            open: n,
            high: n,
            low: n,
            close: n,
            volume: 1,
            oi: None,
        };
        Ok(vec![mk(query.from), mk(query.to)])
    }
}

#[tokio::test]
async fn boundary_overlap_keeps_later_response() {
    let kh = KiteHist::builder()
        .with_provider(Arc::new(EdgeProvider {
            calls: AtomicU32::new(0),
        }))
        .resolution_mapper(thirty_minute_windows())
        .retry(fast_retry(1))
        .build()
        .unwrap();
    let req = HistoryRequest::new(
        equity("SBIN"),
        Resolution::Minute,
        ist(2024, 6, 5, 9, 15),
        ist(2024, 6, 5, 10, 15),
    );
    let HistoryOutcome::Supported(resp) = kh.history(req).await else {
        panic!("expected supported outcome");
    };
    let closes: Vec<Decimal> = resp.iter().map(|b| b.close).collect();
    // 09:15 from call 1, 09:45 overwritten by call 2, 10:15 from call 2
    assert_eq!(closes, vec![Decimal::ONE, Decimal::TWO, Decimal::TWO]);
}
