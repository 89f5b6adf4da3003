//! Daily capacity enforcement over running tasks.

use crate::workload::{
    domain::{DayBoundary, TaskId, capacity_minutes, elapsed_minutes},
    ports::{ActiveTaskCapacity, WorkloadStore, WorkloadStoreError, WorkloadStoreResult},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::Clock;
use tracing::{debug, info, warn};

/// Outcome of one capacity pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityReport {
    /// Running tasks examined.
    pub examined: usize,
    /// Daily counter resets performed at day rollover. An engineer is reset
    /// at most once per calendar day.
    pub rollovers: usize,
    /// Tasks paused because their engineer hit the daily limit.
    pub auto_paused: Vec<TaskId>,
    /// Tasks that should have been paused but could not be.
    pub pause_failures: Vec<TaskId>,
}

/// Pauses running tasks whose engineer has used up the daily budget.
pub struct CapacityMonitor<'a, S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    lifecycle: &'a TaskLifecycleService<S, C>,
    day_boundary: DayBoundary,
}

impl<'a, S, C> CapacityMonitor<'a, S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    /// Creates a monitor that pauses tasks through `lifecycle`.
    #[must_use]
    pub const fn new(lifecycle: &'a TaskLifecycleService<S, C>, day_boundary: DayBoundary) -> Self {
        Self {
            lifecycle,
            day_boundary,
        }
    }

    /// Runs one pass over every running task.
    ///
    /// Pause failures are logged and recorded in the report; the pass carries
    /// on with the remaining tasks.
    ///
    /// # Errors
    ///
    /// Returns a store error when reading running tasks, resetting a daily
    /// counter, or re-reading an engineer fails.
    pub async fn enforce(&self) -> WorkloadStoreResult<CapacityReport> {
        let rows = self
            .lifecycle
            .store()
            .list_active_tasks_with_engineer_capacity()
            .await?;
        let mut report = CapacityReport {
            examined: rows.len(),
            ..CapacityReport::default()
        };

        for row in rows {
            self.check(row, &mut report).await?;
        }
        Ok(report)
    }

    async fn check(
        &self,
        row: ActiveTaskCapacity,
        report: &mut CapacityReport,
    ) -> WorkloadStoreResult<()> {
        let Some(last_started_at) = row.last_started_at else {
            debug!(task_id = %row.task_id, "running task has no start instant, skipping");
            return Ok(());
        };
        let store = self.lifecycle.store();
        let now = self.lifecycle.clock().utc();
        let started_today = self.day_boundary.same_day(last_started_at, now);

        if !started_today {
            let today = self.day_boundary.date_of(now);
            let _engineer_guard = self
                .lifecycle
                .locks()
                .engineers()
                .lock(row.engineer_id)
                .await;
            match store.begin_engineer_day(row.engineer_id, today).await {
                Ok(true) => {
                    report.rollovers += 1;
                    info!(
                        engineer_id = %row.engineer_id,
                        %today,
                        "daily minutes reset at day rollover"
                    );
                }
                Ok(false) | Err(WorkloadStoreError::EngineerNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        let Some(engineer) = store.find_engineer(row.engineer_id).await? else {
            warn!(
                task_id = %row.task_id,
                engineer_id = %row.engineer_id,
                "engineer vanished during capacity check"
            );
            return Ok(());
        };

        let elapsed = if started_today {
            elapsed_minutes(last_started_at, now)
        } else {
            0
        };
        let total = engineer.minutes_worked_today().saturating_add(elapsed);
        let capacity = capacity_minutes(row.daily_capacity_hours);
        debug!(
            task_id = %row.task_id,
            engineer_id = %row.engineer_id,
            worked = engineer.minutes_worked_today(),
            elapsed,
            total,
            capacity,
            "capacity checked"
        );

        if total < capacity {
            return Ok(());
        }

        match self.pause_and_record(row, total).await {
            Ok(()) => {
                info!(
                    task_id = %row.task_id,
                    engineer_id = %row.engineer_id,
                    total,
                    capacity,
                    "task paused at daily capacity"
                );
                report.auto_paused.push(row.task_id);
            }
            Err(err) => {
                warn!(task_id = %row.task_id, error = %err, "failed to pause task at daily capacity");
                report.pause_failures.push(row.task_id);
            }
        }
        Ok(())
    }

    async fn pause_and_record(
        &self,
        row: ActiveTaskCapacity,
        total: u64,
    ) -> Result<(), TaskLifecycleError> {
        self.lifecycle.pause(row.task_id).await?;
        self.lifecycle
            .set_minutes_worked_today(row.engineer_id, total)
            .await
    }
}
