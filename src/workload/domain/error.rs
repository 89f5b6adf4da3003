//! Error types for workload domain validation, transitions, and parsing.

use super::{EngineerId, TaskId, TaskStatus};
use thiserror::Error;

/// Lifecycle action requested on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    /// Begin or resume work.
    Start,
    /// Stop the running interval without finishing.
    Pause,
    /// Stop the running interval and finish the task.
    Complete,
}

impl LifecycleAction {
    /// Returns the lowercase action name used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while constructing or transitioning workload values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkloadDomainError {
    /// A record name is empty after trimming.
    #[error("name must not be empty")]
    EmptyName,

    /// The engineer daily capacity is zero.
    #[error("daily capacity must be a positive number of hours")]
    InvalidCapacity,

    /// The engineer efficiency factor is not a positive finite number.
    #[error("efficiency factor must be a positive finite number, got {0}")]
    InvalidEfficiency(String),

    /// The task estimate is zero.
    #[error("estimated minutes must be a positive integer")]
    InvalidEstimate,

    /// The requested lifecycle action is not valid from the task's status.
    #[error("task {task_id} cannot {action} while {status}")]
    InvalidTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Current task status.
        status: TaskStatus,
        /// Rejected action.
        action: LifecycleAction,
    },

    /// Persisted lifecycle fields contradict the task status.
    #[error("task {task_id} is {status} but {problem}")]
    InconsistentLifecycle {
        /// Task whose fields disagree.
        task_id: TaskId,
        /// Recorded status.
        status: TaskStatus,
        /// Which field disagrees.
        problem: &'static str,
    },

    /// The task has no assigned engineer and cannot start.
    #[error("task {0} has no assigned engineer")]
    Unassigned(TaskId),

    /// The engineer has reached the daily capacity.
    #[error(
        "engineer {engineer_id} reached daily capacity ({worked_minutes} of {capacity_minutes} minutes)"
    )]
    CapacityExceeded {
        /// Engineer at or over the limit.
        engineer_id: EngineerId,
        /// Minutes already worked today.
        worked_minutes: u64,
        /// Daily capacity in minutes.
        capacity_minutes: u64,
    },
}

/// Error returned while parsing enumerations from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseWorkloadValueError {
    /// Unknown task status string.
    #[error("unknown task status: {0}")]
    Status(String),
    /// Unknown task priority string.
    #[error("unknown task priority: {0}")]
    Priority(String),
}
