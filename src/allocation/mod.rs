//! Periodic allocation of engineers to tasks.
//!
//! One allocation cycle plans assignment changes from a snapshot of the
//! workload store ([`plan`]), persists them ([`AllocationEngine`]), and then
//! enforces each engineer's daily capacity ([`CapacityMonitor`]). The
//! [`AllocationScheduler`] drives cycles on a fixed cadence with
//! single-flight protection.

mod capacity;
mod engine;
pub mod plan;
mod scheduler;

pub use capacity::{CapacityMonitor, CapacityReport};
pub use engine::{AllocationEngine, AllocationError, AllocationResult, CycleSummary};
pub use plan::{AllocationPlan, AssignmentChange, BusySet, plan_allocation};
pub use scheduler::{AllocationScheduler, SchedulerStatsSnapshot};

#[cfg(test)]
mod tests;
