//! Workload store port: the persistence collaborator of the allocation core.

use crate::workload::domain::{
    Engineer, EngineerId, Task, TaskId, TaskLifecycleFields, WorkloadDomainError,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for workload store operations.
pub type WorkloadStoreResult<T> = Result<T, WorkloadStoreError>;

/// A running task joined with its engineer's capacity figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTaskCapacity {
    /// Running task.
    pub task_id: TaskId,
    /// Engineer assigned to the task.
    pub engineer_id: EngineerId,
    /// Start of the running interval.
    pub last_started_at: Option<DateTime<Utc>>,
    /// Engineer daily capacity in hours.
    pub daily_capacity_hours: u32,
    /// Engineer minutes worked today at read time.
    pub minutes_worked_today: u64,
}

/// Engineer and task persistence contract.
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Returns every engineer.
    async fn list_engineers(&self) -> WorkloadStoreResult<Vec<Engineer>>;

    /// Returns every task in store order.
    async fn list_tasks(&self) -> WorkloadStoreResult<Vec<Task>>;

    /// Finds an engineer by identifier.
    ///
    /// Returns `None` when the engineer does not exist.
    async fn find_engineer(&self, id: EngineerId) -> WorkloadStoreResult<Option<Engineer>>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> WorkloadStoreResult<Option<Task>>;

    /// Returns in-progress tasks joined with their engineer's capacity.
    ///
    /// Tasks whose engineer no longer exists are omitted.
    async fn list_active_tasks_with_engineer_capacity(
        &self,
    ) -> WorkloadStoreResult<Vec<ActiveTaskCapacity>>;

    /// Sets or clears the engineer assigned to a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task_assignment(
        &self,
        task_id: TaskId,
        engineer_id: Option<EngineerId>,
    ) -> WorkloadStoreResult<()>;

    /// Moves `engineer_id` from `from_task` to `to_task` as one write.
    ///
    /// Either both assignments change or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::TaskNotFound`] when either task does not
    /// exist.
    async fn swap_assignment(
        &self,
        from_task: TaskId,
        to_task: TaskId,
        engineer_id: EngineerId,
    ) -> WorkloadStoreResult<()>;

    /// Overwrites an engineer's minutes worked today.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::EngineerNotFound`] when the engineer does
    /// not exist.
    async fn update_engineer_minutes_worked_today(
        &self,
        engineer_id: EngineerId,
        minutes: u64,
    ) -> WorkloadStoreResult<()>;

    /// Opens calendar `day` for an engineer's daily accounting.
    ///
    /// Clears `minutes_worked_today` only when `day` is later than the last
    /// day opened for the engineer, and reports whether it did. Later calls
    /// for the same day leave the counter alone.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::EngineerNotFound`] when the engineer does
    /// not exist.
    async fn begin_engineer_day(
        &self,
        engineer_id: EngineerId,
        day: NaiveDate,
    ) -> WorkloadStoreResult<bool>;

    /// Writes a task's lifecycle fields.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task_lifecycle(
        &self,
        task_id: TaskId,
        fields: TaskLifecycleFields,
    ) -> WorkloadStoreResult<()>;

    /// Deletes an engineer record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::EngineerNotFound`] when the engineer does
    /// not exist.
    async fn remove_engineer(&self, engineer_id: EngineerId) -> WorkloadStoreResult<()>;
}

/// Errors returned by workload store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkloadStoreError {
    /// The engineer was not found.
    #[error("engineer not found: {0}")]
    EngineerNotFound(EngineerId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A record with the same identifier already exists.
    #[error("duplicate record identifier: {0}")]
    Duplicate(String),

    /// A record read from outside the domain constructors failed validation.
    #[error("invalid {record}: {source}")]
    InvalidRecord {
        /// Record kind and identifier.
        record: String,
        /// Validation failure.
        #[source]
        source: WorkloadDomainError,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkloadStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
