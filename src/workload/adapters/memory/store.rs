//! In-memory workload store for tests and embedded use.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::workload::{
    domain::{Engineer, EngineerId, Task, TaskId, TaskLifecycleFields, TaskStatus},
    ports::{ActiveTaskCapacity, WorkloadStore, WorkloadStoreError, WorkloadStoreResult},
};

/// Serializable contents of a workload store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    /// Engineers in insertion order.
    #[serde(default)]
    pub engineers: Vec<Engineer>,
    /// Tasks in insertion order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Thread-safe in-memory workload store.
///
/// Listing operations return records in insertion order. Removing an engineer
/// clears the assignment on every task that referenced it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkloadStore {
    state: Arc<RwLock<InMemoryWorkloadState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkloadState {
    engineers: HashMap<EngineerId, Engineer>,
    engineer_order: Vec<EngineerId>,
    tasks: HashMap<TaskId, Task>,
    task_order: Vec<TaskId>,
}

impl InMemoryWorkloadState {
    fn insert_engineer(&mut self, engineer: Engineer) -> WorkloadStoreResult<()> {
        if self.engineers.contains_key(&engineer.id()) {
            return Err(WorkloadStoreError::Duplicate(format!(
                "engineer {}",
                engineer.id()
            )));
        }
        self.engineer_order.push(engineer.id());
        self.engineers.insert(engineer.id(), engineer);
        Ok(())
    }

    fn insert_task(&mut self, task: Task) -> WorkloadStoreResult<()> {
        if self.tasks.contains_key(&task.id()) {
            return Err(WorkloadStoreError::Duplicate(format!("task {}", task.id())));
        }
        self.task_order.push(task.id());
        self.tasks.insert(task.id(), task);
        Ok(())
    }

    fn task_mut(&mut self, id: TaskId) -> WorkloadStoreResult<&mut Task> {
        self.tasks
            .get_mut(&id)
            .ok_or(WorkloadStoreError::TaskNotFound(id))
    }

    fn ordered_tasks(&self) -> impl Iterator<Item = &Task> {
        self.task_order.iter().filter_map(|id| self.tasks.get(id))
    }
}

impl InMemoryWorkloadStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the snapshot's records.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::InvalidRecord`] when a record breaks an
    /// engineer rule or a task lifecycle rule, and
    /// [`WorkloadStoreError::Duplicate`] when the snapshot repeats an
    /// identifier.
    pub fn from_snapshot(snapshot: WorkloadSnapshot) -> WorkloadStoreResult<Self> {
        let mut state = InMemoryWorkloadState::default();
        for engineer in snapshot.engineers {
            engineer
                .ensure_valid()
                .map_err(|source| WorkloadStoreError::InvalidRecord {
                    record: format!("engineer {}", engineer.id()),
                    source,
                })?;
            state.insert_engineer(engineer)?;
        }
        for task in snapshot.tasks {
            task.ensure_consistent()
                .map_err(|source| WorkloadStoreError::InvalidRecord {
                    record: format!("task {}", task.id()),
                    source,
                })?;
            state.insert_task(task)?;
        }
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Adds an engineer record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::Duplicate`] when the identifier is taken.
    pub fn insert_engineer(&self, engineer: Engineer) -> WorkloadStoreResult<()> {
        self.write()?.insert_engineer(engineer)
    }

    /// Adds a task record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::Duplicate`] when the identifier is taken.
    pub fn insert_task(&self, task: Task) -> WorkloadStoreResult<()> {
        self.write()?.insert_task(task)
    }

    /// Returns a copy of every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadStoreError::Persistence`] when the state lock is
    /// poisoned.
    pub fn snapshot(&self) -> WorkloadStoreResult<WorkloadSnapshot> {
        let state = self.read()?;
        Ok(WorkloadSnapshot {
            engineers: state
                .engineer_order
                .iter()
                .filter_map(|id| state.engineers.get(id).cloned())
                .collect(),
            tasks: state.ordered_tasks().cloned().collect(),
        })
    }

    fn read(&self) -> WorkloadStoreResult<RwLockReadGuard<'_, InMemoryWorkloadState>> {
        self.state.read().map_err(|err| {
            WorkloadStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> WorkloadStoreResult<RwLockWriteGuard<'_, InMemoryWorkloadState>> {
        self.state.write().map_err(|err| {
            WorkloadStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl WorkloadStore for InMemoryWorkloadStore {
    async fn list_engineers(&self) -> WorkloadStoreResult<Vec<Engineer>> {
        let state = self.read()?;
        Ok(state
            .engineer_order
            .iter()
            .filter_map(|id| state.engineers.get(id).cloned())
            .collect())
    }

    async fn list_tasks(&self) -> WorkloadStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.ordered_tasks().cloned().collect())
    }

    async fn find_engineer(&self, id: EngineerId) -> WorkloadStoreResult<Option<Engineer>> {
        let state = self.read()?;
        Ok(state.engineers.get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> WorkloadStoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_active_tasks_with_engineer_capacity(
        &self,
    ) -> WorkloadStoreResult<Vec<ActiveTaskCapacity>> {
        let state = self.read()?;
        let rows = state
            .ordered_tasks()
            .filter(|task| task.status() == TaskStatus::InProgress)
            .filter_map(|task| {
                let engineer_id = task.assigned_engineer_id()?;
                let engineer = state.engineers.get(&engineer_id)?;
                Some(ActiveTaskCapacity {
                    task_id: task.id(),
                    engineer_id,
                    last_started_at: task.last_started_at(),
                    daily_capacity_hours: engineer.daily_capacity_hours(),
                    minutes_worked_today: engineer.minutes_worked_today(),
                })
            })
            .collect();
        Ok(rows)
    }

    async fn update_task_assignment(
        &self,
        task_id: TaskId,
        engineer_id: Option<EngineerId>,
    ) -> WorkloadStoreResult<()> {
        let mut state = self.write()?;
        state.task_mut(task_id)?.set_assigned_engineer(engineer_id);
        Ok(())
    }

    async fn swap_assignment(
        &self,
        from_task: TaskId,
        to_task: TaskId,
        engineer_id: EngineerId,
    ) -> WorkloadStoreResult<()> {
        let mut state = self.write()?;
        // Validate both halves before touching either.
        for id in [from_task, to_task] {
            if !state.tasks.contains_key(&id) {
                return Err(WorkloadStoreError::TaskNotFound(id));
            }
        }
        state.task_mut(from_task)?.set_assigned_engineer(None);
        state.task_mut(to_task)?.set_assigned_engineer(Some(engineer_id));
        Ok(())
    }

    async fn update_engineer_minutes_worked_today(
        &self,
        engineer_id: EngineerId,
        minutes: u64,
    ) -> WorkloadStoreResult<()> {
        let mut state = self.write()?;
        let engineer = state
            .engineers
            .get_mut(&engineer_id)
            .ok_or(WorkloadStoreError::EngineerNotFound(engineer_id))?;
        engineer.set_minutes_worked_today(minutes);
        Ok(())
    }

    async fn begin_engineer_day(
        &self,
        engineer_id: EngineerId,
        day: NaiveDate,
    ) -> WorkloadStoreResult<bool> {
        let mut state = self.write()?;
        let engineer = state
            .engineers
            .get_mut(&engineer_id)
            .ok_or(WorkloadStoreError::EngineerNotFound(engineer_id))?;
        Ok(engineer.begin_day(day))
    }

    async fn update_task_lifecycle(
        &self,
        task_id: TaskId,
        fields: TaskLifecycleFields,
    ) -> WorkloadStoreResult<()> {
        let mut state = self.write()?;
        state.task_mut(task_id)?.apply_lifecycle_fields(fields);
        Ok(())
    }

    async fn remove_engineer(&self, engineer_id: EngineerId) -> WorkloadStoreResult<()> {
        let mut state = self.write()?;
        if state.engineers.remove(&engineer_id).is_none() {
            return Err(WorkloadStoreError::EngineerNotFound(engineer_id));
        }
        state.engineer_order.retain(|id| *id != engineer_id);
        for task in state.tasks.values_mut() {
            if task.assigned_engineer_id() == Some(engineer_id) {
                task.set_assigned_engineer(None);
            }
        }
        Ok(())
    }
}
