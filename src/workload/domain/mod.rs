//! Domain model for engineers, tasks, and time tracking.
//!
//! The workload domain models task assignment and the task lifecycle state
//! machine while keeping storage and scheduling concerns outside of the
//! domain boundary.

mod engineer;
mod error;
mod estimate;
mod ids;
mod task;
mod time;

pub use engineer::{Engineer, MINUTES_PER_HOUR, capacity_minutes};
pub use error::{LifecycleAction, ParseWorkloadValueError, WorkloadDomainError};
pub use estimate::TaskEstimate;
pub use ids::{EngineerId, TaskId};
pub use task::{PersistedTaskData, Task, TaskLifecycleFields, TaskPriority, TaskStatus};
pub use time::{DayBoundary, elapsed_minutes};
