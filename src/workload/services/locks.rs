//! Per-record async mutual exclusion.

use crate::workload::domain::{EngineerId, TaskId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily created async mutex per record key.
///
/// Guards serialize work on one record without blocking work on any other.
#[derive(Debug)]
pub struct RecordLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for RecordLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> RecordLocks<K>
where
    K: Copy + Eq + Hash + Ord,
{
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let slot = self.slot(key);
        slot.lock_owned().await
    }

    /// Waits for exclusive access to every key, acquiring in ascending order.
    ///
    /// Duplicate keys are locked once.
    pub async fn lock_all(&self, keys: impl IntoIterator<Item = K>) -> Vec<OwnedMutexGuard<()>> {
        let mut ordered: Vec<K> = keys.into_iter().collect();
        ordered.sort_unstable();
        ordered.dedup();
        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.lock(key).await);
        }
        guards
    }

    fn slot(&self, key: K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }
}

/// Lock tables shared by every service that mutates workload records.
///
/// Callers that need both kinds of lock acquire task locks before engineer
/// locks.
#[derive(Debug, Default)]
pub struct WorkloadLocks {
    tasks: RecordLocks<TaskId>,
    engineers: RecordLocks<EngineerId>,
}

impl WorkloadLocks {
    /// Creates empty lock tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the task lock table.
    #[must_use]
    pub const fn tasks(&self) -> &RecordLocks<TaskId> {
        &self.tasks
    }

    /// Returns the engineer lock table.
    #[must_use]
    pub const fn engineers(&self) -> &RecordLocks<EngineerId> {
        &self.engineers
    }
}
