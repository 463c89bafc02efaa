use chrono::TimeDelta;

use crate::Bar;

/// Estimate a representative step (in seconds) from positive adjacent timestamp
/// deltas in the input series.
///
/// Prefer the mode (most frequent positive delta); if there is no unique mode,
/// return the lower median.
///
/// ```
/// use kitehist_core::{Bar, Resolution, Symbol, estimate_step_seconds};
/// use chrono::DateTime;
/// use rust_decimal::Decimal;
///
/// let sym = Symbol::india_equity("SBIN").unwrap();
/// let mk = |ts: i64| Bar {
///     time: DateTime::from_timestamp(ts, 0).unwrap(),
///     symbol: sym.clone(),
///     resolution: Resolution::Minute,
///     open: Decimal::ONE, high: Decimal::ONE, low: Decimal::ONE, close: Decimal::ONE,
///     volume: 0,
/// };
/// // Adjacent deltas: 60,60,60,120,180  => unique mode is 60
/// let bars = vec![mk(0), mk(60), mk(120), mk(180), mk(300), mk(480)];
/// assert_eq!(estimate_step_seconds(&bars), Some(60));
/// ```
///
/// The input order does not matter; duplicates are ignored. Returns `None` if
/// fewer than two distinct timestamps are present.
#[must_use]
pub fn estimate_step_seconds(bars: &[Bar]) -> Option<i64> {
    let mut ts: Vec<_> = bars.iter().map(|b| b.time).collect();
    if ts.len() < 2 {
        return None;
    }
    ts.sort_unstable();

    let mut deltas: Vec<i64> = ts
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| *dt > TimeDelta::zero())
        .map(|dt| dt.num_seconds())
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();

    // Run-length over sorted deltas; track how many runs tie for the longest.
    let mut best_delta = deltas[0];
    let mut best_count = 0usize;
    let mut ties = 0usize;
    for run in deltas.chunk_by(|a, b| a == b) {
        match run.len().cmp(&best_count) {
            std::cmp::Ordering::Greater => {
                best_count = run.len();
                best_delta = run[0];
                ties = 1;
            }
            std::cmp::Ordering::Equal => ties += 1,
            std::cmp::Ordering::Less => {}
        }
    }

    if ties == 1 {
        return Some(best_delta);
    }
    Some(deltas[(deltas.len() - 1) / 2])
}
