use std::sync::Arc;

use chrono::TimeDelta;
use kitehist::{HistoryOutcome, KiteError, Resolution, SecurityType, UnsupportedReason};
use kitehist_mock::MockProvider;

use crate::helpers::{equity, kite_with, session_close, symbol};

#[tokio::test]
async fn aggregates_in_symbol_order() {
    let kh = kite_with(Arc::new(MockProvider::new()));
    let symbols = vec![
        equity("SBIN"),
        equity("FAIL"),
        symbol("EURUSD", SecurityType::Forex, "oanda"),
        equity("INFY"),
        equity("EMPTY"),
    ];
    let report = kh
        .download()
        .symbols(&symbols)
        .unwrap()
        .resolution(Resolution::Minute)
        .lookback(session_close(), TimeDelta::hours(1))
        .run()
        .await
        .unwrap();

    let order: Vec<&str> = report.entries.iter().map(|e| e.symbol.ticker()).collect();
    assert_eq!(order, vec!["SBIN", "FAIL", "EURUSD", "INFY", "EMPTY"]);

    let supported: Vec<&str> = report.supported().map(|(s, _)| s.ticker()).collect();
    assert_eq!(supported, vec!["SBIN", "INFY", "EMPTY"]);
    let unsupported: Vec<&str> = report.unsupported().map(|(s, _)| s.ticker()).collect();
    assert_eq!(unsupported, vec!["EURUSD"]);

    assert!(matches!(report.entries[1].outcome, HistoryOutcome::Failed(_)));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("FAIL: "));

    let empty = report.entries[4].outcome.response().unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn rejects_duplicate_symbols() {
    let kh = kite_with(Arc::new(MockProvider::new()));
    let err = kh
        .download()
        .symbols(&[equity("SBIN"), equity("sbin")])
        .err()
        .unwrap();
    assert!(matches!(err, KiteError::InvalidArg(_)));

    let err = kh
        .download()
        .add_symbol(equity("TCS"))
        .unwrap()
        .add_symbol(equity("TCS"))
        .err()
        .unwrap();
    assert!(matches!(err, KiteError::InvalidArg(_)));
}

#[tokio::test]
async fn requires_symbols_and_period() {
    let kh = kite_with(Arc::new(MockProvider::new()));
    let err = kh
        .download()
        .lookback(session_close(), TimeDelta::hours(1))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, KiteError::InvalidArg(msg) if msg.contains("no symbols")));

    let err = kh
        .download()
        .add_symbol(equity("SBIN"))
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, KiteError::InvalidArg(msg) if msg.contains("no period")));
}

#[tokio::test]
async fn extreme_negative_lookback_is_unsupported_not_a_panic() {
    let kh = kite_with(Arc::new(MockProvider::new()));
    let report = kh
        .download()
        .add_symbol(equity("SBIN"))
        .unwrap()
        .lookback(session_close(), TimeDelta::MIN)
        .run()
        .await
        .unwrap();
    assert!(matches!(
        report.entries[0].outcome,
        HistoryOutcome::Unsupported(UnsupportedReason::InvalidRange { .. })
    ));
}
