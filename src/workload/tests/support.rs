//! Shared fixtures for workload and allocation unit tests.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::workload::domain::{Engineer, EngineerId, Task, TaskId, TaskPriority, TaskStatus};

/// Manually advanced clock.
#[derive(Debug)]
pub(crate) struct StepClock {
    now: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub(crate) const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::minutes(minutes);
    }
}

impl Clock for StepClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed instant on 2024-03-04 at the given UTC wall time.
pub(crate) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0)
        .single()
        .expect("valid fixed instant")
}

pub(crate) fn engineer(id: u64, hours: u32) -> Engineer {
    Engineer::new(EngineerId::new(id), format!("engineer-{id}"), hours, 1.0)
        .expect("valid engineer")
}

pub(crate) fn task(id: u64, priority: TaskPriority) -> Task {
    Task::new(TaskId::new(id), format!("task-{id}"), priority, 60).expect("valid task")
}

pub(crate) fn assigned(id: u64, priority: TaskPriority, engineer_id: u64) -> Task {
    task(id, priority).with_engineer(EngineerId::new(engineer_id))
}

/// Drives an assigned task into `status` through the lifecycle, with the
/// running interval (if any) starting at `since`.
pub(crate) fn in_status(mut task: Task, status: TaskStatus, since: DateTime<Utc>) -> Task {
    if status == TaskStatus::Pending {
        return task;
    }
    task.start(since).expect("assigned task should start");
    match status {
        TaskStatus::Paused => {
            task.pause(since).expect("running task should pause");
        }
        TaskStatus::Completed => {
            task.complete(since).expect("running task should complete");
        }
        TaskStatus::Pending | TaskStatus::InProgress => {}
    }
    task
}
