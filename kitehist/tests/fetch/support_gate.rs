use std::sync::Arc;

use chrono::TimeDelta;
use kitehist::{
    BarType, HistoryOutcome, HistoryRequest, Resolution, SecurityType, Symbol, UnsupportedReason,
};
use kitehist_mock::MockProvider;

use crate::helpers::{equity, kite_with, session_close, symbol};

fn lookback(sym: Symbol, res: Resolution, period: TimeDelta) -> HistoryRequest {
    HistoryRequest::lookback(sym, res, session_close(), period)
}

async fn assert_valid(res: Resolution, period: TimeDelta) {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let resp = kh
        .history_opt(lookback(equity("SBIN"), res, period))
        .await
        .unwrap()
        .expect("supported request yields a response");
    assert!(!resp.is_empty(), "{res}: expected bars");
    assert!(resp.warnings.is_empty());
    for pair in resp.bars.windows(2) {
        assert!(pair[0].time < pair[1].time);
    }
    for bar in &resp {
        assert!(bar.is_consistent());
        assert_eq!(bar.resolution, res);
        assert_eq!(bar.symbol.ticker(), "SBIN");
    }
    assert!(mock.call_count() >= 1);
}

async fn assert_unsupported(req: HistoryRequest) -> UnsupportedReason {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock.clone());
    let outcome = kh.history(req.clone()).await;
    assert_eq!(mock.call_count(), 0, "no broker call for unsupported request");
    assert!(kh.history_opt(req).await.unwrap().is_none());
    match outcome {
        HistoryOutcome::Unsupported(reason) => reason,
        other => panic!("expected unsupported, got {other:?}"),
    }
}

#[tokio::test]
async fn minute_over_one_hour_is_valid() {
    assert_valid(Resolution::Minute, TimeDelta::hours(1)).await;
}

#[tokio::test]
async fn hour_over_one_day_is_valid() {
    assert_valid(Resolution::Hour, TimeDelta::days(1)).await;
}

#[tokio::test]
async fn daily_over_fifteen_days_is_valid() {
    assert_valid(Resolution::Daily, TimeDelta::days(15)).await;
}

#[tokio::test]
async fn negative_period_is_unsupported() {
    let req = lookback(equity("SBIN"), Resolution::Daily, TimeDelta::days(-15));
    let reason = assert_unsupported(req).await;
    assert!(matches!(reason, UnsupportedReason::InvalidRange { .. }));
}

#[tokio::test]
async fn zero_period_is_unsupported() {
    let req = lookback(equity("SBIN"), Resolution::Minute, TimeDelta::zero());
    let reason = assert_unsupported(req).await;
    assert!(matches!(reason, UnsupportedReason::InvalidRange { .. }));
}

#[tokio::test]
async fn forex_is_unsupported() {
    let reason = assert_unsupported(lookback(
        symbol("EURUSD", SecurityType::Forex, "oanda"),
        Resolution::Daily,
        TimeDelta::days(15),
    ))
    .await;
    assert!(matches!(reason, UnsupportedReason::Market { .. }));

    let reason = assert_unsupported(lookback(
        symbol("EURUSD", SecurityType::Forex, "india"),
        Resolution::Daily,
        TimeDelta::days(15),
    ))
    .await;
    assert_eq!(reason, UnsupportedReason::SecurityType(SecurityType::Forex));
}

#[tokio::test]
async fn tick_and_second_are_unsupported() {
    for res in [Resolution::Tick, Resolution::Second] {
        let reason =
            assert_unsupported(lookback(equity("SBIN"), res, TimeDelta::minutes(1))).await;
        assert_eq!(reason, UnsupportedReason::Resolution(res));
    }
}

#[tokio::test]
async fn quote_bars_are_unsupported() {
    let req = lookback(equity("SBIN"), Resolution::Minute, TimeDelta::hours(1))
        .with_bar_type(BarType::QuoteBar);
    let reason = assert_unsupported(req).await;
    assert_eq!(reason, UnsupportedReason::DataType(BarType::QuoteBar));
}

#[tokio::test]
async fn foreign_market_is_unsupported() {
    let req = lookback(
        symbol("SBIN", SecurityType::Equity, "usa"),
        Resolution::Daily,
        TimeDelta::days(15),
    );
    let reason = assert_unsupported(req).await;
    assert!(matches!(reason, UnsupportedReason::Market { .. }));
}

#[tokio::test]
async fn supported_but_empty_is_not_null() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock);
    let resp = kh
        .history_opt(lookback(equity("EMPTY"), Resolution::Minute, TimeDelta::hours(1)))
        .await
        .unwrap();
    assert!(resp.is_some_and(|r| r.is_empty() && r.warnings.is_empty()));
}

#[tokio::test]
async fn repeated_fetches_are_idempotent() {
    let mock = Arc::new(MockProvider::new());
    let kh = kite_with(mock);
    let req = lookback(equity("INFY"), Resolution::Hour, TimeDelta::days(10));
    let a = kh.history(req.clone()).await;
    let b = kh.history(req).await;
    assert_eq!(a, b);
}
