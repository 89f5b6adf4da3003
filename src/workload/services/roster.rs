//! Engineer retirement: releasing an engineer's tasks before removal.

use crate::workload::{
    domain::{EngineerId, TaskId},
    ports::WorkloadStore,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{TaskLifecycleError, TaskLifecycleResult, WorkloadLocks};

/// Outcome of retiring an engineer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetirementSummary {
    /// Tasks that were in progress or paused and went back to pending.
    pub requeued: Vec<TaskId>,
    /// Every task whose assignment was cleared.
    pub released: Vec<TaskId>,
}

/// Coordinates engineer removal with the tasks that reference it.
pub struct EngineerRosterService<S>
where
    S: WorkloadStore,
{
    store: Arc<S>,
    locks: Arc<WorkloadLocks>,
}

impl<S> Clone for EngineerRosterService<S>
where
    S: WorkloadStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S> EngineerRosterService<S>
where
    S: WorkloadStore,
{
    /// Creates a roster service sharing lock tables with the lifecycle
    /// service.
    #[must_use]
    pub const fn new(store: Arc<S>, locks: Arc<WorkloadLocks>) -> Self {
        Self { store, locks }
    }

    /// Releases every task referencing the engineer, then removes it.
    ///
    /// Running or paused tasks return to pending without crediting the open
    /// interval. Completed tasks keep their status and lose the reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EngineerNotFound`] when the engineer does
    /// not exist, or [`TaskLifecycleError::Store`] when a read or write fails.
    pub async fn retire(&self, engineer_id: EngineerId) -> TaskLifecycleResult<RetirementSummary> {
        let mut locked = self.referencing_tasks(engineer_id).await?;
        loop {
            let task_guards = self.locks.tasks().lock_all(locked.iter().copied()).await;
            let engineer_guard = self.locks.engineers().lock(engineer_id).await;

            // A start needs the engineer lock, so once it is held no task
            // outside the re-listed set can begin running for this engineer.
            let current = self.referencing_tasks(engineer_id).await?;
            if current.iter().all(|task_id| locked.contains(task_id)) {
                return self.release_and_remove(engineer_id, current).await;
            }
            drop(engineer_guard);
            drop(task_guards);
            debug!(%engineer_id, "task references changed while locking, retrying");
            locked = current;
        }
    }

    async fn referencing_tasks(&self, engineer_id: EngineerId) -> TaskLifecycleResult<Vec<TaskId>> {
        Ok(self
            .store
            .list_tasks()
            .await?
            .iter()
            .filter(|task| task.assigned_engineer_id() == Some(engineer_id))
            .map(|task| task.id())
            .collect())
    }

    async fn release_and_remove(
        &self,
        engineer_id: EngineerId,
        referencing: Vec<TaskId>,
    ) -> TaskLifecycleResult<RetirementSummary> {
        if self.store.find_engineer(engineer_id).await?.is_none() {
            return Err(TaskLifecycleError::EngineerNotFound(engineer_id));
        }

        let mut summary = RetirementSummary::default();
        for task_id in referencing {
            let Some(mut task) = self.store.find_task(task_id).await? else {
                continue;
            };
            if task.assigned_engineer_id() != Some(engineer_id) {
                continue;
            }
            let before = task.status();
            task.return_to_pending();
            if task.status() != before {
                self.store
                    .update_task_lifecycle(task_id, task.lifecycle_fields())
                    .await?;
                summary.requeued.push(task_id);
            }
            self.store.update_task_assignment(task_id, None).await?;
            summary.released.push(task_id);
        }

        self.store.remove_engineer(engineer_id).await?;
        info!(
            %engineer_id,
            requeued = summary.requeued.len(),
            released = summary.released.len(),
            "engineer retired"
        );
        Ok(summary)
    }
}
