//! Resolution to broker-interval mapping and pagination into per-call windows.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Resolution, UnsupportedReason, validate_range};

/// How one resolution is requested from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    /// Broker interval token.
    pub interval: &'static str,
    /// Longest range one call may cover.
    pub max_span: TimeDelta,
}

/// Maps canonical resolutions to broker intervals and per-call span caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionMapper {
    policies: Vec<(Resolution, IntervalPolicy)>,
}

impl ResolutionMapper {
    /// Kite Connect limits: minute 60 days, 60minute 400 days, day 2000 days.
    #[must_use]
    pub fn kite() -> Self {
        Self {
            policies: vec![
                (
                    Resolution::Minute,
                    IntervalPolicy {
                        interval: "minute",
                        max_span: TimeDelta::days(60),
                    },
                ),
                (
                    Resolution::Hour,
                    IntervalPolicy {
                        interval: "60minute",
                        max_span: TimeDelta::days(400),
                    },
                ),
                (
                    Resolution::Daily,
                    IntervalPolicy {
                        interval: "day",
                        max_span: TimeDelta::days(2000),
                    },
                ),
            ],
        }
    }

    /// A mapper with no resolutions; add them with [`ResolutionMapper::with_policy`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Insert or replace the policy for `resolution`.
    #[must_use]
    pub fn with_policy(mut self, resolution: Resolution, policy: IntervalPolicy) -> Self {
        let policy = IntervalPolicy {
            max_span: policy.max_span.max(TimeDelta::seconds(1)),
            ..policy
        };
        if let Some(slot) = self.policies.iter_mut().find(|(r, _)| *r == resolution) {
            slot.1 = policy;
        } else {
            self.policies.push((resolution, policy));
        }
        self
    }

    /// Override the per-call span for an already mapped resolution.
    ///
    /// Spans below one second are raised to one second. Unmapped resolutions are ignored.
    #[must_use]
    pub fn with_max_span(mut self, resolution: Resolution, max_span: TimeDelta) -> Self {
        if let Some(slot) = self.policies.iter_mut().find(|(r, _)| *r == resolution) {
            slot.1.max_span = max_span.max(TimeDelta::seconds(1));
        }
        self
    }

    /// Policy for `resolution`.
    ///
    /// # Errors
    /// Returns `UnsupportedReason::Resolution` when the broker has no interval for it.
    pub fn policy(&self, resolution: Resolution) -> Result<IntervalPolicy, UnsupportedReason> {
        self.policies
            .iter()
            .find(|(r, _)| *r == resolution)
            .map(|(_, p)| *p)
            .ok_or(UnsupportedReason::Resolution(resolution))
    }

    /// Broker interval token for `resolution`.
    ///
    /// # Errors
    /// See [`ResolutionMapper::policy`].
    pub fn interval_for(&self, resolution: Resolution) -> Result<&'static str, UnsupportedReason> {
        self.policy(resolution).map(|p| p.interval)
    }

    /// Split `start..end` into consecutive windows no longer than the resolution's cap.
    ///
    /// Windows share boundary instants: `windows[i].end == windows[i + 1].start`.
    ///
    /// # Errors
    /// Returns an unsupported reason for unmapped resolutions or invalid ranges.
    pub fn plan_for(
        &self,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PaginationPlan, UnsupportedReason> {
        let policy = self.policy(resolution)?;
        validate_range(start, end)?;

        let mut windows = Vec::new();
        let mut cursor = start;
        while cursor < end {
            let next = cursor
                .checked_add_signed(policy.max_span)
                .map_or(end, |n| n.min(end));
            windows.push(Window {
                start: cursor,
                end: next,
            });
            cursor = next;
        }

        Ok(PaginationPlan {
            resolution,
            interval: policy.interval,
            windows,
        })
    }
}

impl Default for ResolutionMapper {
    fn default() -> Self {
        Self::kite()
    }
}

/// One broker call's time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    /// Window start (UTC).
    pub start: DateTime<Utc>,
    /// Window end (UTC).
    pub end: DateTime<Utc>,
}

impl Window {
    /// Length of the window.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Ordered windows covering a request exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationPlan {
    /// Resolution the plan was built for.
    pub resolution: Resolution,
    /// Broker interval token.
    pub interval: &'static str,
    /// Windows in chronological order.
    pub windows: Vec<Window>,
}

impl PaginationPlan {
    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// True if the plan has no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Iterate windows in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }
}

impl<'a> IntoIterator for &'a PaginationPlan {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}
