//! Application services for task lifecycle and engineer roster changes.

mod lifecycle;
mod locks;
mod roster;

pub use lifecycle::{
    LifecycleErrorKind, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
pub use locks::{RecordLocks, WorkloadLocks};
pub use roster::{EngineerRosterService, RetirementSummary};
