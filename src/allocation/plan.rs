//! Pure allocation planning over a snapshot of engineers and tasks.
//!
//! Every function here is a stateless transform of the records read at the
//! start of a cycle, so the assignment policy can be exercised without a
//! store.

use crate::workload::domain::{Engineer, EngineerId, Task, TaskId, TaskStatus};
use std::collections::{HashMap, HashSet, VecDeque};

/// A single assignment change produced by planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentChange {
    /// Move an engineer from a pending lower-priority task to a high-priority
    /// unassigned task.
    Swap {
        /// Task that loses the engineer.
        from_task: TaskId,
        /// High-priority task that gains the engineer.
        to_task: TaskId,
        /// Engineer being moved.
        engineer_id: EngineerId,
    },
    /// Give an idle engineer to an unassigned task.
    Assign {
        /// Task that gains the engineer.
        task_id: TaskId,
        /// Engineer being assigned.
        engineer_id: EngineerId,
    },
}

/// Ordered list of assignment changes for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    changes: Vec<AssignmentChange>,
}

impl AllocationPlan {
    /// Returns the changes in application order.
    #[must_use]
    pub fn changes(&self) -> &[AssignmentChange] {
        &self.changes
    }

    /// Returns `true` when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of swap changes.
    #[must_use]
    pub fn swap_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| matches!(change, AssignmentChange::Swap { .. }))
            .count()
    }

    /// Returns the number of plain assignment changes.
    #[must_use]
    pub fn assign_count(&self) -> usize {
        self.changes.len().saturating_sub(self.swap_count())
    }
}

impl IntoIterator for AllocationPlan {
    type Item = AssignmentChange;
    type IntoIter = std::vec::IntoIter<AssignmentChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Engineers holding at least one open (non-completed) task.
///
/// Tracks open references per engineer so a swap can release the source
/// task's reference before testing whether the engineer is still occupied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusySet {
    open_refs: HashMap<EngineerId, usize>,
}

impl BusySet {
    /// Builds the busy set from the cycle snapshot.
    ///
    /// Engineers referenced only by completed tasks are not busy.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut open_refs: HashMap<EngineerId, usize> = HashMap::new();
        for task in tasks {
            if task.status() == TaskStatus::Completed {
                continue;
            }
            if let Some(engineer_id) = task.assigned_engineer_id() {
                *open_refs.entry(engineer_id).or_default() += 1;
            }
        }
        Self { open_refs }
    }

    /// Returns `true` when the engineer holds an open reference.
    #[must_use]
    pub fn contains(&self, engineer_id: EngineerId) -> bool {
        self.open_refs
            .get(&engineer_id)
            .is_some_and(|count| *count > 0)
    }

    /// Records one more open reference for the engineer.
    pub fn insert(&mut self, engineer_id: EngineerId) {
        *self.open_refs.entry(engineer_id).or_default() += 1;
    }

    /// Drops one open reference for the engineer.
    pub fn release(&mut self, engineer_id: EngineerId) {
        if let Some(count) = self.open_refs.get_mut(&engineer_id) {
            *count = count.saturating_sub(1);
        }
    }

    /// Returns the busy engineers in ascending id order.
    #[must_use]
    pub fn engineers(&self) -> Vec<EngineerId> {
        let mut ids: Vec<EngineerId> = self
            .open_refs
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Stable partition placing high-priority tasks first.
///
/// Relative order inside each partition is preserved.
#[must_use]
pub fn prioritise(tasks: &[Task]) -> Vec<&Task> {
    let (high, rest): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|task| task.priority().is_high());
    high.into_iter().chain(rest).collect()
}

/// Tasks with no assigned engineer, in the given order.
#[must_use]
pub fn unassigned_tasks<'a>(ordered: &[&'a Task]) -> Vec<&'a Task> {
    ordered
        .iter()
        .copied()
        .filter(|task| task.assigned_engineer_id().is_none())
        .collect()
}

/// FIFO pool of assigned, pending, non-high-priority tasks.
///
/// Each entry pairs the task with its current engineer. Running and paused
/// tasks never enter the pool.
#[must_use]
pub fn reassignable_pool(ordered: &[&Task]) -> VecDeque<(TaskId, EngineerId)> {
    ordered
        .iter()
        .filter(|task| task.status() == TaskStatus::Pending && !task.priority().is_high())
        .filter_map(|task| Some((task.id(), task.assigned_engineer_id()?)))
        .collect()
}

/// Engineers outside the busy set, ascending by id.
#[must_use]
pub fn available_engineers(engineers: &[Engineer], busy: &BusySet) -> VecDeque<EngineerId> {
    let mut ids: Vec<EngineerId> = engineers
        .iter()
        .map(Engineer::id)
        .filter(|id| !busy.contains(*id))
        .collect();
    ids.sort_unstable();
    ids.into()
}

/// Plans the assignment changes for one cycle.
///
/// High-priority unassigned tasks first try to take the engineer of the
/// oldest reassignable pool entry. A pool entry whose engineer still holds
/// another open task is discarded for the rest of the cycle. Remaining
/// unassigned tasks then receive idle engineers in ascending id order.
#[must_use]
pub fn plan_allocation(engineers: &[Engineer], tasks: &[Task]) -> AllocationPlan {
    let ordered = prioritise(tasks);
    let mut busy = BusySet::from_tasks(ordered.iter().copied());
    let unassigned = unassigned_tasks(&ordered);
    let mut pool = reassignable_pool(&ordered);

    let mut changes = Vec::new();
    let mut placed: HashSet<TaskId> = HashSet::new();

    for task in unassigned.iter().filter(|task| task.priority().is_high()) {
        let Some((from_task, engineer_id)) = pool.pop_front() else {
            continue;
        };
        busy.release(engineer_id);
        if busy.contains(engineer_id) {
            busy.insert(engineer_id);
            continue;
        }
        busy.insert(engineer_id);
        placed.insert(task.id());
        changes.push(AssignmentChange::Swap {
            from_task,
            to_task: task.id(),
            engineer_id,
        });
    }

    let mut available = available_engineers(engineers, &busy);
    for task in unassigned.iter().filter(|task| !placed.contains(&task.id())) {
        let Some(engineer_id) = available.pop_front() else {
            break;
        };
        if busy.contains(engineer_id) {
            continue;
        }
        busy.insert(engineer_id);
        changes.push(AssignmentChange::Assign {
            task_id: task.id(),
            engineer_id,
        });
    }

    AllocationPlan { changes }
}
