//! Service layer for task start, pause, and complete transitions.

use crate::workload::{
    domain::{Engineer, EngineerId, LifecycleAction, Task, TaskId, WorkloadDomainError},
    ports::{WorkloadStore, WorkloadStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::WorkloadLocks;

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// The task references an engineer that does not exist.
    #[error("engineer {0} not found")]
    EngineerNotFound(EngineerId),
    /// Domain validation or transition rules rejected the request.
    #[error(transparent)]
    Domain(#[from] WorkloadDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] WorkloadStoreError),
}

/// Coarse classification of lifecycle failures for request handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleErrorKind {
    /// Referenced task or engineer is absent.
    NotFound,
    /// Lifecycle precondition violated.
    InvalidTransition,
    /// Start attempted with no engineer.
    Unassigned,
    /// Start blocked by the engineer's daily limit.
    CapacityExceeded,
    /// Record validation failed.
    Invalid,
    /// Underlying read or write failure.
    Store,
}

impl TaskLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> LifecycleErrorKind {
        match self {
            Self::TaskNotFound(_)
            | Self::EngineerNotFound(_)
            | Self::Store(
                WorkloadStoreError::TaskNotFound(_) | WorkloadStoreError::EngineerNotFound(_),
            ) => LifecycleErrorKind::NotFound,
            Self::Store(_) => LifecycleErrorKind::Store,
            Self::Domain(WorkloadDomainError::InvalidTransition { .. }) => {
                LifecycleErrorKind::InvalidTransition
            }
            Self::Domain(WorkloadDomainError::Unassigned(_)) => LifecycleErrorKind::Unassigned,
            Self::Domain(WorkloadDomainError::CapacityExceeded { .. }) => {
                LifecycleErrorKind::CapacityExceeded
            }
            Self::Domain(_) => LifecycleErrorKind::Invalid,
        }
    }
}

/// Transitions that close the running interval.
#[derive(Debug, Clone, Copy)]
enum IntervalEnd {
    Pause,
    Complete,
}

impl IntervalEnd {
    const fn action(self) -> LifecycleAction {
        match self {
            Self::Pause => LifecycleAction::Pause,
            Self::Complete => LifecycleAction::Complete,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Each transition checks its preconditions and writes its effects while
/// holding the task's record lock, and the engineer's record lock whenever the
/// engineer's daily minutes are read or written.
pub struct TaskLifecycleService<S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    locks: Arc<WorkloadLocks>,
}

impl<S, C> Clone for TaskLifecycleService<S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S, C> TaskLifecycleService<S, C>
where
    S: WorkloadStore,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service with its own lock tables.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_locks(store, clock, Arc::new(WorkloadLocks::new()))
    }

    /// Creates a lifecycle service sharing lock tables with other services.
    #[must_use]
    pub const fn with_locks(store: Arc<S>, clock: Arc<C>, locks: Arc<WorkloadLocks>) -> Self {
        Self {
            store,
            clock,
            locks,
        }
    }

    /// Returns the store this service writes to.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the clock this service reads.
    #[must_use]
    pub const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Returns the shared record lock tables.
    #[must_use]
    pub const fn locks(&self) -> &Arc<WorkloadLocks> {
        &self.locks
    }

    /// Starts or resumes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] or
    /// [`TaskLifecycleError::EngineerNotFound`] for missing records, and
    /// [`TaskLifecycleError::Domain`] with `InvalidTransition`, `Unassigned`,
    /// or `CapacityExceeded` when a precondition fails. No state changes on
    /// failure.
    pub async fn start(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let _task_guard = self.locks.tasks().lock(task_id).await;
        let mut task = self.load_task(task_id).await?;
        let engineer_id = task.ensure_startable()?;

        let _engineer_guard = self.locks.engineers().lock(engineer_id).await;
        let engineer = self.load_engineer(engineer_id).await?;
        engineer.ensure_capacity_remaining()?;

        task.start(self.clock.utc())?;
        self.store
            .update_task_lifecycle(task_id, task.lifecycle_fields())
            .await?;

        info!(%task_id, %engineer_id, "task started");
        Ok(task)
    }

    /// Pauses a running task, crediting the interval to the task and to the
    /// engineer's minutes worked today.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for a missing task and
    /// [`TaskLifecycleError::Domain`] with `InvalidTransition` when the task
    /// is not running.
    pub async fn pause(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.close_interval(task_id, IntervalEnd::Pause).await
    }

    /// Completes a running task, crediting the interval like [`Self::pause`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::pause`].
    pub async fn complete(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.close_interval(task_id, IntervalEnd::Complete).await
    }

    /// Overwrites an engineer's minutes worked today under the engineer lock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the engineer is missing or
    /// the write fails.
    pub async fn set_minutes_worked_today(
        &self,
        engineer_id: EngineerId,
        minutes: u64,
    ) -> TaskLifecycleResult<()> {
        let _engineer_guard = self.locks.engineers().lock(engineer_id).await;
        self.store
            .update_engineer_minutes_worked_today(engineer_id, minutes)
            .await?;
        debug!(%engineer_id, minutes, "minutes worked today updated");
        Ok(())
    }

    async fn close_interval(&self, task_id: TaskId, stop: IntervalEnd) -> TaskLifecycleResult<Task> {
        let _task_guard = self.locks.tasks().lock(task_id).await;
        let mut task = self.load_task(task_id).await?;
        let now = self.clock.utc();
        let elapsed = match stop {
            IntervalEnd::Pause => task.pause(now)?,
            IntervalEnd::Complete => task.complete(now)?,
        };
        let action = stop.action();

        let Some(engineer_id) = task.assigned_engineer_id() else {
            self.store
                .update_task_lifecycle(task_id, task.lifecycle_fields())
                .await?;
            info!(%task_id, elapsed, action = %action, "unassigned task stopped");
            return Ok(task);
        };

        let _engineer_guard = self.locks.engineers().lock(engineer_id).await;
        let engineer = self.load_engineer(engineer_id).await?;
        let worked = engineer.minutes_worked_today().saturating_add(elapsed);

        self.store
            .update_task_lifecycle(task_id, task.lifecycle_fields())
            .await?;
        self.store
            .update_engineer_minutes_worked_today(engineer_id, worked)
            .await?;

        info!(
            %task_id,
            %engineer_id,
            elapsed,
            minutes_spent = task.minutes_spent(),
            minutes_worked_today = worked,
            action = %action,
            "task interval closed"
        );
        Ok(task)
    }

    async fn load_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    async fn load_engineer(&self, engineer_id: EngineerId) -> TaskLifecycleResult<Engineer> {
        self.store
            .find_engineer(engineer_id)
            .await?
            .ok_or(TaskLifecycleError::EngineerNotFound(engineer_id))
    }
}
