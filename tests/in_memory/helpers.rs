//! Shared test helpers for in-memory workload integration tests.

use allotment::allocation::AllocationEngine;
use allotment::workload::{
    adapters::memory::InMemoryWorkloadStore,
    domain::{DayBoundary, Engineer, EngineerId, Task, TaskId, TaskPriority},
    services::{EngineerRosterService, TaskLifecycleService},
};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `minutes`.
    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Services wired to one shared store, clock, and lock table.
pub struct Workload {
    /// Backing store.
    pub store: Arc<InMemoryWorkloadStore>,
    /// Shared clock.
    pub clock: Arc<ManualClock>,
    /// Lifecycle service.
    pub lifecycle: TaskLifecycleService<InMemoryWorkloadStore, ManualClock>,
    /// Roster service.
    pub roster: EngineerRosterService<InMemoryWorkloadStore>,
    /// Allocation engine.
    pub engine: Arc<AllocationEngine<InMemoryWorkloadStore, ManualClock>>,
}

/// Monday morning, 09:00 UTC.
#[must_use]
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
        .single()
        .expect("valid fixed instant")
}

/// Provides an empty workload starting Monday morning.
#[fixture]
pub fn workload() -> Workload {
    let store = Arc::new(InMemoryWorkloadStore::new());
    let clock = Arc::new(ManualClock::new(monday_morning()));
    let lifecycle = TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock));
    let roster = EngineerRosterService::new(Arc::clone(&store), Arc::clone(lifecycle.locks()));
    let engine = Arc::new(AllocationEngine::new(lifecycle.clone(), DayBoundary::utc()));
    Workload {
        store,
        clock,
        lifecycle,
        roster,
        engine,
    }
}

impl Workload {
    /// Adds an engineer with a unit efficiency factor.
    pub fn hire(&self, id: u64, name: &str, hours: u32) {
        let engineer =
            Engineer::new(EngineerId::new(id), name, hours, 1.0).expect("valid engineer");
        self.store.insert_engineer(engineer).expect("unique engineer");
    }

    /// Adds an unassigned pending task.
    pub fn add_task(&self, id: u64, name: &str, priority: TaskPriority) {
        let task = Task::new(TaskId::new(id), name, priority, 120).expect("valid task");
        self.store.insert_task(task).expect("unique task");
    }
}
