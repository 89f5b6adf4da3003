//! Daily capacity enforcement against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use eyre::{OptionExt as _, ensure};
use rstest::rstest;

use crate::allocation::CapacityMonitor;
use crate::workload::{
    adapters::memory::InMemoryWorkloadStore,
    domain::{DayBoundary, EngineerId, TaskId, TaskPriority, TaskStatus},
    ports::WorkloadStore,
    services::TaskLifecycleService,
};
use crate::workload::tests::support::{StepClock, assigned, at, engineer, in_status};

type TestService = TaskLifecycleService<InMemoryWorkloadStore, StepClock>;

fn service_with(worked: u64, started_at: DateTime<Utc>, now: DateTime<Utc>) -> TestService {
    let store = InMemoryWorkloadStore::new();
    store
        .insert_engineer(engineer(1, 8).with_minutes_worked_today(worked))
        .expect("seed engineer");
    store
        .insert_task(in_status(
            assigned(1, TaskPriority::Medium, 1),
            TaskStatus::InProgress,
            started_at,
        ))
        .expect("seed task");
    TaskLifecycleService::new(Arc::new(store), Arc::new(StepClock::at(now)))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn engineer_over_budget_has_running_task_paused() -> eyre::Result<()> {
    let service = service_with(470, at(11, 45), at(12, 0));

    let report = CapacityMonitor::new(&service, DayBoundary::utc())
        .enforce()
        .await?;

    ensure!(report.examined == 1);
    ensure!(report.auto_paused == vec![TaskId::new(1)]);
    ensure!(report.pause_failures.is_empty());

    let paused = service
        .store()
        .find_task(TaskId::new(1))
        .await?
        .ok_or_eyre("task 1")?;
    ensure!(paused.status() == TaskStatus::Paused);
    ensure!(paused.minutes_spent() == 15);
    let worker = service
        .store()
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(worker.minutes_worked_today() == 485);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn engineer_under_budget_keeps_working() -> eyre::Result<()> {
    let service = service_with(100, at(11, 30), at(12, 0));

    let report = CapacityMonitor::new(&service, DayBoundary::utc())
        .enforce()
        .await?;

    ensure!(report.examined == 1);
    ensure!(report.auto_paused.is_empty());
    let running = service
        .store()
        .find_task(TaskId::new(1))
        .await?
        .ok_or_eyre("task 1")?;
    ensure!(running.status() == TaskStatus::InProgress);
    ensure!(running.minutes_spent() == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn budget_is_reached_exactly_at_capacity() -> eyre::Result<()> {
    let service = service_with(420, at(11, 0), at(12, 0));

    let report = CapacityMonitor::new(&service, DayBoundary::utc())
        .enforce()
        .await?;

    ensure!(report.auto_paused == vec![TaskId::new(1)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_started_yesterday_resets_daily_minutes() -> eyre::Result<()> {
    let yesterday = Utc
        .with_ymd_and_hms(2024, 3, 3, 22, 0, 0)
        .single()
        .ok_or_eyre("valid instant")?;
    let service = service_with(470, yesterday, at(1, 0));

    let report = CapacityMonitor::new(&service, DayBoundary::utc())
        .enforce()
        .await?;

    ensure!(report.rollovers == 1);
    ensure!(report.auto_paused.is_empty());
    let worker = service
        .store()
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(worker.minutes_worked_today() == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rollover_follows_the_configured_calendar() -> eyre::Result<()> {
    let yesterday_utc = Utc
        .with_ymd_and_hms(2024, 3, 3, 22, 0, 0)
        .single()
        .ok_or_eyre("valid instant")?;
    let service = service_with(100, yesterday_utc, at(1, 0));
    let plus_five =
        DayBoundary::new(FixedOffset::east_opt(5 * 3600).ok_or_eyre("valid offset")?);

    let report = CapacityMonitor::new(&service, plus_five).enforce().await?;

    // 03:00 and 06:00 local on 2024-03-04: same day, so the 180 minutes count.
    ensure!(report.rollovers == 0);
    ensure!(report.auto_paused.is_empty());
    let worker = service
        .store()
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(worker.minutes_worked_today() == 100);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn minutes_credited_after_rollover_survive_later_passes() -> eyre::Result<()> {
    let yesterday = Utc
        .with_ymd_and_hms(2024, 3, 3, 22, 0, 0)
        .single()
        .ok_or_eyre("valid instant")?;
    let service = service_with(470, yesterday, at(9, 0));
    let monitor = CapacityMonitor::new(&service, DayBoundary::utc());

    let first = monitor.enforce().await?;
    ensure!(first.rollovers == 1);

    service
        .store()
        .insert_task(assigned(2, TaskPriority::Low, 1))?;
    service.start(TaskId::new(2)).await?;
    service.clock().advance_minutes(60);
    service.pause(TaskId::new(2)).await?;

    let second = monitor.enforce().await?;

    ensure!(second.rollovers == 0, "the day was already opened");
    let worker = service
        .store()
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(worker.minutes_worked_today() == 60);
    ensure!(worker.minutes_day() == Some(at(9, 0).date_naive()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_day_resets_again() -> eyre::Result<()> {
    let two_days_ago = Utc
        .with_ymd_and_hms(2024, 3, 2, 22, 0, 0)
        .single()
        .ok_or_eyre("valid instant")?;
    let service = service_with(0, two_days_ago, at(9, 0) - chrono::Duration::days(1));
    let monitor = CapacityMonitor::new(&service, DayBoundary::utc());

    ensure!(monitor.enforce().await?.rollovers == 1);
    service
        .store()
        .update_engineer_minutes_worked_today(EngineerId::new(1), 300)
        .await?;
    service.clock().advance_minutes(24 * 60);

    ensure!(monitor.enforce().await?.rollovers == 1);
    let worker = service
        .store()
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(worker.minutes_worked_today() == 0);
    Ok(())
}
