//! Task record and the start/pause/complete state machine.

use super::{
    EngineerId, LifecycleAction, ParseWorkloadValueError, TaskId, WorkloadDomainError,
    elapsed_minutes,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Preempts lower priorities during allocation.
    High,
    /// Normal priority.
    Medium,
    /// Lowest priority.
    Low,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Returns `true` for [`TaskPriority::High`].
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseWorkloadValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseWorkloadValueError::Priority(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not been started.
    Pending,
    /// Task is being worked on.
    InProgress,
    /// Work is temporarily stopped.
    Paused,
    /// Work is finished.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` when `start` is valid from this status.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Pending | Self::Paused)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseWorkloadValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseWorkloadValueError::Status(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle fields written back to the store after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLifecycleFields {
    /// New status.
    pub status: TaskStatus,
    /// First start instant.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion instant.
    pub completed_at: Option<DateTime<Utc>>,
    /// Start of the running interval.
    pub last_started_at: Option<DateTime<Utc>>,
    /// Most recent pause instant.
    pub last_paused_at: Option<DateTime<Utc>>,
    /// Accumulated working minutes.
    pub minutes_spent: u64,
}

/// Task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    priority: TaskPriority,
    estimated_minutes: u32,
    status: TaskStatus,
    assigned_engineer_id: Option<EngineerId>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    last_started_at: Option<DateTime<Utc>>,
    last_paused_at: Option<DateTime<Utc>>,
    minutes_spent: u64,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted display name.
    pub name: String,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted estimate in minutes.
    pub estimated_minutes: u32,
    /// Persisted assignment, if any.
    pub assigned_engineer_id: Option<EngineerId>,
    /// Persisted lifecycle fields.
    pub lifecycle: TaskLifecycleFields,
}

impl Task {
    /// Creates a validated, unassigned, pending task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::EmptyName`] for a blank name or
    /// [`WorkloadDomainError::InvalidEstimate`] for a zero estimate.
    pub fn new(
        id: TaskId,
        name: impl Into<String>,
        priority: TaskPriority,
        estimated_minutes: u32,
    ) -> Result<Self, WorkloadDomainError> {
        let raw_name = name.into();
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(WorkloadDomainError::EmptyName);
        }
        if estimated_minutes == 0 {
            return Err(WorkloadDomainError::InvalidEstimate);
        }

        Ok(Self {
            id,
            name: trimmed.to_owned(),
            priority,
            estimated_minutes,
            status: TaskStatus::Pending,
            assigned_engineer_id: None,
            started_at: None,
            completed_at: None,
            last_started_at: None,
            last_paused_at: None,
            minutes_spent: 0,
        })
    }

    /// Assigns an engineer at construction time.
    #[must_use]
    pub const fn with_engineer(mut self, engineer_id: EngineerId) -> Self {
        self.assigned_engineer_id = Some(engineer_id);
        self
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let lifecycle = data.lifecycle;
        Self {
            id: data.id,
            name: data.name,
            priority: data.priority,
            estimated_minutes: data.estimated_minutes,
            status: lifecycle.status,
            assigned_engineer_id: data.assigned_engineer_id,
            started_at: lifecycle.started_at,
            completed_at: lifecycle.completed_at,
            last_started_at: lifecycle.last_started_at,
            last_paused_at: lifecycle.last_paused_at,
            minutes_spent: lifecycle.minutes_spent,
        }
    }

    /// Checks a record that bypassed [`Task::new`], such as one read from a
    /// snapshot.
    ///
    /// Besides the constructor rules, a running task must have an engineer
    /// and a running interval, and only a running task may have one.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::EmptyName`],
    /// [`WorkloadDomainError::InvalidEstimate`], or
    /// [`WorkloadDomainError::InconsistentLifecycle`].
    pub fn ensure_consistent(&self) -> Result<(), WorkloadDomainError> {
        if self.name.trim().is_empty() {
            return Err(WorkloadDomainError::EmptyName);
        }
        if self.estimated_minutes == 0 {
            return Err(WorkloadDomainError::InvalidEstimate);
        }
        let running = self.status == TaskStatus::InProgress;
        let problem = if running && self.assigned_engineer_id.is_none() {
            Some("no engineer is assigned")
        } else if running && self.last_started_at.is_none() {
            Some("the running interval has no start")
        } else if !running && self.last_started_at.is_some() {
            Some("a running interval is open")
        } else {
            None
        };
        problem.map_or(Ok(()), |problem| {
            Err(WorkloadDomainError::InconsistentLifecycle {
                task_id: self.id,
                status: self.status,
                problem,
            })
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the informational estimate in minutes.
    #[must_use]
    pub const fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assigned engineer, if any.
    #[must_use]
    pub const fn assigned_engineer_id(&self) -> Option<EngineerId> {
        self.assigned_engineer_id
    }

    /// Returns the first start instant.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the completion instant.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the start of the running interval, set only while in progress.
    #[must_use]
    pub const fn last_started_at(&self) -> Option<DateTime<Utc>> {
        self.last_started_at
    }

    /// Returns the most recent pause instant.
    #[must_use]
    pub const fn last_paused_at(&self) -> Option<DateTime<Utc>> {
        self.last_paused_at
    }

    /// Returns the accumulated working minutes.
    #[must_use]
    pub const fn minutes_spent(&self) -> u64 {
        self.minutes_spent
    }

    /// Returns the fields a lifecycle transition writes back.
    #[must_use]
    pub const fn lifecycle_fields(&self) -> TaskLifecycleFields {
        TaskLifecycleFields {
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            last_started_at: self.last_started_at,
            last_paused_at: self.last_paused_at,
            minutes_spent: self.minutes_spent,
        }
    }

    /// Overwrites the lifecycle fields with stored values.
    pub const fn apply_lifecycle_fields(&mut self, fields: TaskLifecycleFields) {
        self.status = fields.status;
        self.started_at = fields.started_at;
        self.completed_at = fields.completed_at;
        self.last_started_at = fields.last_started_at;
        self.last_paused_at = fields.last_paused_at;
        self.minutes_spent = fields.minutes_spent;
    }

    /// Replaces the assigned engineer.
    pub const fn set_assigned_engineer(&mut self, engineer_id: Option<EngineerId>) {
        self.assigned_engineer_id = engineer_id;
    }

    /// Checks the task-local `start` preconditions and returns the engineer
    /// that would do the work.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::InvalidTransition`] unless the task is
    /// pending or paused, and [`WorkloadDomainError::Unassigned`] when no
    /// engineer is assigned.
    pub const fn ensure_startable(&self) -> Result<EngineerId, WorkloadDomainError> {
        if !self.status.can_start() {
            return Err(self.rejected(LifecycleAction::Start));
        }
        match self.assigned_engineer_id {
            Some(engineer_id) => Ok(engineer_id),
            None => Err(WorkloadDomainError::Unassigned(self.id)),
        }
    }

    /// Moves the task into progress.
    ///
    /// `started_at` is only set the first time; `last_paused_at` is cleared.
    ///
    /// # Errors
    ///
    /// Propagates the failures of [`Task::ensure_startable`].
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), WorkloadDomainError> {
        self.ensure_startable()?;
        self.status = TaskStatus::InProgress;
        self.started_at = Some(self.started_at.unwrap_or(now));
        self.last_started_at = Some(now);
        self.last_paused_at = None;
        Ok(())
    }

    /// Stops the running interval and returns its whole elapsed minutes.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::InvalidTransition`] when the task is not
    /// running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<u64, WorkloadDomainError> {
        let elapsed = self.close_interval(LifecycleAction::Pause, now)?;
        self.status = TaskStatus::Paused;
        self.last_paused_at = Some(now);
        Ok(elapsed)
    }

    /// Stops the running interval, finishes the task, and returns the
    /// interval's whole elapsed minutes.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::InvalidTransition`] when the task is not
    /// running.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<u64, WorkloadDomainError> {
        let elapsed = self.close_interval(LifecycleAction::Complete, now)?;
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        Ok(elapsed)
    }

    /// Returns the task to the pending queue without crediting the open
    /// interval. Completed tasks keep their status.
    pub const fn return_to_pending(&mut self) {
        if matches!(self.status, TaskStatus::InProgress | TaskStatus::Paused) {
            self.status = TaskStatus::Pending;
            self.last_started_at = None;
            self.last_paused_at = None;
        }
    }

    fn close_interval(
        &mut self,
        action: LifecycleAction,
        now: DateTime<Utc>,
    ) -> Result<u64, WorkloadDomainError> {
        let Some(last_started_at) = self.last_started_at else {
            return Err(self.rejected(action));
        };
        let elapsed = elapsed_minutes(last_started_at, now);
        self.minutes_spent = self.minutes_spent.saturating_add(elapsed);
        self.last_started_at = None;
        Ok(elapsed)
    }

    const fn rejected(&self, action: LifecycleAction) -> WorkloadDomainError {
        WorkloadDomainError::InvalidTransition {
            task_id: self.id,
            status: self.status,
            action,
        }
    }
}
