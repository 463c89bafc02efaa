use chrono::{DateTime, Utc};

use crate::UnsupportedReason;

/// A range is valid only when `start` is strictly before `end`.
#[must_use]
pub fn is_valid_range(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start < end
}

/// Reject empty or inverted ranges.
///
/// # Errors
/// Returns `UnsupportedReason::InvalidRange` when `end <= start`.
pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), UnsupportedReason> {
    if is_valid_range(start, end) {
        Ok(())
    } else {
        Err(UnsupportedReason::InvalidRange { start, end })
    }
}
