//! Calendar-day and elapsed-minute arithmetic.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset as _, Utc};

/// Whole minutes elapsed from `since` to `now`, truncated.
///
/// Clock skew that puts `since` after `now` counts as zero minutes.
#[must_use]
pub fn elapsed_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_minutes()).unwrap_or(0)
}

/// Decides which calendar day an instant belongs to.
///
/// Daily capacity counters reset when a running task is observed with a
/// start instant on an earlier calendar day than the current instant. The
/// calendar is evaluated at a fixed UTC offset so the result does not depend
/// on the host time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

impl DayBoundary {
    /// Creates a boundary evaluated at the given offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Boundary at UTC midnight.
    #[must_use]
    pub fn utc() -> Self {
        Self::default()
    }

    /// Returns the configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Returns the calendar date of an instant.
    #[must_use]
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Returns `true` when both instants fall on the same calendar date.
    #[must_use]
    pub fn same_day(&self, first: DateTime<Utc>, second: DateTime<Utc>) -> bool {
        self.date_of(first) == self.date_of(second)
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}
