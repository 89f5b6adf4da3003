//! Allocation cycle orchestration.

use crate::workload::{
    domain::{DayBoundary, EngineerId, TaskId, TaskStatus},
    ports::{WorkloadStore, WorkloadStoreError},
    services::TaskLifecycleService,
};
use mockable::Clock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{AssignmentChange, CapacityMonitor, CapacityReport, plan_allocation};

/// Errors that abort an allocation cycle.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Another cycle holds the single-flight gate.
    #[error("an allocation cycle is already running")]
    CycleInProgress,
    /// Store read or write failed.
    #[error(transparent)]
    Store(#[from] WorkloadStoreError),
}

/// Result type for allocation cycles.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Counters describing one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Engineers moved from a pending task to a high-priority task.
    pub swaps: usize,
    /// Idle engineers given an unassigned task.
    pub assignments: usize,
    /// Planned changes dropped because the records moved on mid-cycle.
    pub stale_changes: usize,
    /// Running tasks inspected by the capacity pass.
    pub running_tasks_checked: usize,
    /// Daily counter resets at day rollover.
    pub rollovers: usize,
    /// Tasks paused at daily capacity.
    pub auto_pauses: usize,
    /// Capacity pauses that failed.
    pub pause_failures: usize,
}

impl CycleSummary {
    /// Total assignment changes persisted.
    #[must_use]
    pub const fn reassignments(&self) -> usize {
        self.swaps.saturating_add(self.assignments)
    }

    fn absorb(&mut self, report: &CapacityReport) {
        self.running_tasks_checked = report.examined;
        self.rollovers = report.rollovers;
        self.auto_pauses = report.auto_paused.len();
        self.pause_failures = report.pause_failures.len();
    }
}

/// Whether a planned change was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeOutcome {
    Applied,
    Stale,
}

/// Runs allocation cycles against a workload store.
///
/// At most one cycle runs at a time; a trigger that arrives while a cycle is
/// running fails fast with [`AllocationError::CycleInProgress`].
pub struct AllocationEngine<S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    lifecycle: TaskLifecycleService<S, C>,
    day_boundary: DayBoundary,
    cycle_gate: Mutex<()>,
}

impl<S, C> AllocationEngine<S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    /// Creates an engine that pauses tasks and takes record locks through
    /// `lifecycle`.
    #[must_use]
    pub fn new(lifecycle: TaskLifecycleService<S, C>, day_boundary: DayBoundary) -> Self {
        Self {
            lifecycle,
            day_boundary,
            cycle_gate: Mutex::new(()),
        }
    }

    /// Returns the lifecycle service used by the engine.
    #[must_use]
    pub const fn lifecycle(&self) -> &TaskLifecycleService<S, C> {
        &self.lifecycle
    }

    /// Runs one allocation cycle: reassignment followed by the capacity pass.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::CycleInProgress`] when another cycle is
    /// running, and [`AllocationError::Store`] when a snapshot read, an
    /// assignment write, or a capacity read fails. Capacity pause failures
    /// do not abort the cycle; they are counted in the summary.
    pub async fn run_cycle(&self) -> AllocationResult<CycleSummary> {
        let Ok(_cycle_guard) = self.cycle_gate.try_lock() else {
            warn!("allocation cycle already running, trigger skipped");
            return Err(AllocationError::CycleInProgress);
        };

        self.run_locked_cycle()
            .instrument(info_span!("allocation_cycle"))
            .await
    }

    async fn run_locked_cycle(&self) -> AllocationResult<CycleSummary> {
        let store = self.lifecycle.store();
        let engineers = store.list_engineers().await?;
        let tasks = store.list_tasks().await?;
        let plan = plan_allocation(&engineers, &tasks);
        debug!(
            engineers = engineers.len(),
            tasks = tasks.len(),
            planned = plan.changes().len(),
            "allocation planned"
        );

        let mut summary = CycleSummary::default();
        for change in plan {
            let outcome = self.apply(change).await?;
            match (outcome, change) {
                (ChangeOutcome::Stale, _) => summary.stale_changes += 1,
                (ChangeOutcome::Applied, AssignmentChange::Swap { .. }) => summary.swaps += 1,
                (ChangeOutcome::Applied, AssignmentChange::Assign { .. }) => {
                    summary.assignments += 1;
                }
            }
        }

        let report = CapacityMonitor::new(&self.lifecycle, self.day_boundary)
            .enforce()
            .await?;
        summary.absorb(&report);

        info!(
            swaps = summary.swaps,
            assignments = summary.assignments,
            stale_changes = summary.stale_changes,
            auto_pauses = summary.auto_pauses,
            pause_failures = summary.pause_failures,
            rollovers = summary.rollovers,
            "allocation cycle finished"
        );
        Ok(summary)
    }

    async fn apply(&self, change: AssignmentChange) -> AllocationResult<ChangeOutcome> {
        match change {
            AssignmentChange::Swap {
                from_task,
                to_task,
                engineer_id,
            } => self.apply_swap(from_task, to_task, engineer_id).await,
            AssignmentChange::Assign {
                task_id,
                engineer_id,
            } => self.apply_assign(task_id, engineer_id).await,
        }
    }

    async fn apply_swap(
        &self,
        from_task: TaskId,
        to_task: TaskId,
        engineer_id: EngineerId,
    ) -> AllocationResult<ChangeOutcome> {
        let store = self.lifecycle.store();
        let _task_guards = self
            .lifecycle
            .locks()
            .tasks()
            .lock_all([from_task, to_task])
            .await;

        let source = store.find_task(from_task).await?;
        let target = store.find_task(to_task).await?;
        let source_ready = source.is_some_and(|task| {
            task.status() == TaskStatus::Pending && task.assigned_engineer_id() == Some(engineer_id)
        });
        let target_ready = target.is_some_and(|task| task.assigned_engineer_id().is_none());
        if !source_ready || !target_ready {
            warn!(%from_task, %to_task, %engineer_id, "swap skipped, tasks changed mid-cycle");
            return Ok(ChangeOutcome::Stale);
        }

        store.swap_assignment(from_task, to_task, engineer_id).await?;
        info!(%from_task, %to_task, %engineer_id, "engineer moved to high-priority task");
        Ok(ChangeOutcome::Applied)
    }

    async fn apply_assign(
        &self,
        task_id: TaskId,
        engineer_id: EngineerId,
    ) -> AllocationResult<ChangeOutcome> {
        let store = self.lifecycle.store();
        let _task_guard = self.lifecycle.locks().tasks().lock(task_id).await;

        let still_unassigned = store
            .find_task(task_id)
            .await?
            .is_some_and(|task| task.assigned_engineer_id().is_none());
        if !still_unassigned {
            warn!(%task_id, %engineer_id, "assignment skipped, task changed mid-cycle");
            return Ok(ChangeOutcome::Stale);
        }

        store.update_task_assignment(task_id, Some(engineer_id)).await?;
        info!(%task_id, %engineer_id, "engineer assigned to task");
        Ok(ChangeOutcome::Applied)
    }
}
