//! End-to-end allocation cycles over the in-memory store.

use super::helpers::{Workload, workload};
use allotment::allocation::AllocationError;
use allotment::workload::{
    domain::{EngineerId, TaskId, TaskPriority, TaskStatus},
    ports::WorkloadStore,
};
use eyre::{OptionExt as _, ensure};
use rstest::rstest;
use std::sync::Arc;

async fn engineer_of(workload: &Workload, task_id: u64) -> eyre::Result<Option<u64>> {
    let task = workload
        .store
        .find_task(TaskId::new(task_id))
        .await?
        .ok_or_eyre("task should exist")?;
    Ok(task.assigned_engineer_id().map(EngineerId::value))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_work_is_spread_over_idle_engineers_by_id(workload: Workload) -> eyre::Result<()> {
    workload.hire(3, "Grace", 8);
    workload.hire(1, "Ada", 8);
    workload.add_task(4, "Write release notes", TaskPriority::Medium);
    workload.add_task(5, "Triage bug backlog", TaskPriority::Low);
    workload.add_task(6, "Update dependencies", TaskPriority::Low);

    let summary = workload.engine.run_cycle().await?;

    ensure!(summary.assignments == 2);
    ensure!(engineer_of(&workload, 4).await? == Some(1));
    ensure!(engineer_of(&workload, 5).await? == Some(3));
    ensure!(engineer_of(&workload, 6).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn urgent_task_preempts_queued_work_on_a_later_cycle(
    workload: Workload,
) -> eyre::Result<()> {
    workload.hire(2, "Linus", 8);
    workload.add_task(3, "Refactor settings page", TaskPriority::Medium);
    workload.engine.run_cycle().await?;
    ensure!(engineer_of(&workload, 3).await? == Some(2));

    workload.add_task(2, "Production outage", TaskPriority::High);
    let summary = workload.engine.run_cycle().await?;

    ensure!(summary.swaps == 1);
    ensure!(engineer_of(&workload, 2).await? == Some(2));
    ensure!(engineer_of(&workload, 3).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn started_work_is_not_preempted(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 8);
    workload.add_task(1, "Migrate billing", TaskPriority::Low);
    workload.engine.run_cycle().await?;
    workload.lifecycle.start(TaskId::new(1)).await?;

    workload.add_task(2, "Security patch", TaskPriority::High);
    let summary = workload.engine.run_cycle().await?;

    ensure!(summary.reassignments() == 0);
    ensure!(engineer_of(&workload, 1).await? == Some(1));
    ensure!(engineer_of(&workload, 2).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cycle_pauses_work_once_the_day_is_used_up(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 2);
    workload.add_task(1, "Long investigation", TaskPriority::Medium);
    workload.engine.run_cycle().await?;
    workload.lifecycle.start(TaskId::new(1)).await?;

    workload.clock.advance_minutes(90);
    let early = workload.engine.run_cycle().await?;
    ensure!(early.auto_pauses == 0);

    workload.clock.advance_minutes(45);
    let late = workload.engine.run_cycle().await?;
    ensure!(late.auto_pauses == 1);

    let task = workload
        .store
        .find_task(TaskId::new(1))
        .await?
        .ok_or_eyre("task 1")?;
    ensure!(task.status() == TaskStatus::Paused);
    ensure!(task.minutes_spent() == 135);
    let engineer = workload
        .store
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(engineer.minutes_worked_today() == 135);

    let blocked = workload.lifecycle.start(TaskId::new(1)).await;
    ensure!(blocked.is_err(), "start must be refused at capacity");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlapping_triggers_never_run_together(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 8);
    for id in 1..=20 {
        workload.add_task(id, "Batch item", TaskPriority::Low);
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&workload.engine);
            tokio::spawn(async move { engine.run_cycle().await })
        })
        .collect();
    let mut completed = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => completed += 1,
            Err(AllocationError::CycleInProgress) => {}
            Err(err) => return Err(err.into()),
        }
    }

    ensure!(completed >= 1);
    let assigned = workload
        .store
        .list_tasks()
        .await?
        .iter()
        .filter(|task| task.assigned_engineer_id().is_some())
        .count();
    ensure!(assigned == 1, "one engineer takes exactly one task, got {assigned}");
    Ok(())
}
