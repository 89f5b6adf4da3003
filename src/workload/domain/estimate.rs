//! Effort estimate adjusted for the assigned engineer's efficiency.

use super::{Engineer, MINUTES_PER_HOUR, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Efficiency-adjusted effort for one task and one engineer.
///
/// An efficiency factor of `1.0` keeps the raw estimate; higher factors
/// shrink it and lower factors stretch it, following `estimate * (2 - e)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEstimate {
    /// Task the estimate describes.
    pub task_id: TaskId,
    /// Adjusted effort in whole minutes.
    pub adjusted_minutes: u64,
    /// Working days needed at the engineer's daily capacity.
    pub days_needed: u64,
}

impl TaskEstimate {
    /// Computes the estimate for `task` when worked by `engineer`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "efficiency is a real-valued factor; the product is clamped to a non-negative whole minute count"
    )]
    pub fn for_engineer(task: &Task, engineer: &Engineer) -> Self {
        let scaled = f64::from(task.estimated_minutes()) * (2.0 - engineer.efficiency_factor());
        let adjusted_minutes = scaled.round().max(0.0) as u64;
        let days_needed = adjusted_minutes.div_ceil(engineer.capacity_minutes().max(1));
        Self {
            task_id: task.id(),
            adjusted_minutes,
            days_needed,
        }
    }

    /// Whole hours component of the adjusted effort.
    #[must_use]
    pub const fn hours(&self) -> u64 {
        self.adjusted_minutes.div_euclid(MINUTES_PER_HOUR)
    }

    /// Remaining minutes component of the adjusted effort.
    #[must_use]
    pub const fn minutes(&self) -> u64 {
        self.adjusted_minutes.rem_euclid(MINUTES_PER_HOUR)
    }
}

impl fmt::Display for TaskEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours(), self.minutes())
    }
}
