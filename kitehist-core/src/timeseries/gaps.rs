use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::Bar;

/// A hole between two consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Time of the bar before the hole.
    pub after: DateTime<Utc>,
    /// Time of the bar after the hole.
    pub before: DateTime<Utc>,
}

impl Gap {
    /// Number of whole `step` buckets missing inside the gap.
    #[must_use]
    pub fn missing(&self, step: TimeDelta) -> i64 {
        let step_s = step.num_seconds().max(1);
        (self.before - self.after).num_seconds() / step_s - 1
    }
}

/// Report every adjacent pair of bars further apart than `step`.
///
/// Bars are assumed ordered as returned by the fetcher. Exchange closures
/// (nights, weekends, holidays) show up as gaps; callers filter them as needed.
#[must_use]
pub fn detect_gaps(bars: &[Bar], step: TimeDelta) -> Vec<Gap> {
    bars.windows(2)
        .filter(|w| w[1].time - w[0].time > step)
        .map(|w| Gap {
            after: w[0].time,
            before: w[1].time,
        })
        .collect()
}
