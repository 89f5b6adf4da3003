//! In-memory integration tests for task lifecycle and roster operations.

use super::helpers::{Workload, monday_morning, workload};
use allotment::workload::{
    domain::{EngineerId, TaskEstimate, TaskId, TaskPriority, TaskStatus},
    ports::WorkloadStore,
    services::LifecycleErrorKind,
};
use eyre::{OptionExt as _, ensure};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn working_day_is_tracked_across_interruptions(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 8);
    workload.add_task(7, "Design review", TaskPriority::High);
    workload.engine.run_cycle().await?;
    let id = TaskId::new(7);

    workload.lifecycle.start(id).await?;
    workload.clock.advance_minutes(50);
    workload.lifecycle.pause(id).await?;
    workload.clock.advance_minutes(30);
    workload.lifecycle.start(id).await?;
    workload.clock.advance_minutes(25);
    let done = workload.lifecycle.complete(id).await?;

    ensure!(done.status() == TaskStatus::Completed);
    ensure!(done.minutes_spent() == 75);
    ensure!(done.started_at() == Some(monday_morning()));
    let engineer = workload
        .store
        .find_engineer(EngineerId::new(1))
        .await?
        .ok_or_eyre("engineer 1")?;
    ensure!(engineer.minutes_worked_today() == 75);

    let again = workload.lifecycle.start(id).await;
    ensure!(matches!(
        again,
        Err(err) if err.kind() == LifecycleErrorKind::InvalidTransition
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retired_engineers_work_is_picked_up_next_cycle(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 8);
    workload.add_task(1, "Payments API", TaskPriority::Medium);
    workload.engine.run_cycle().await?;
    workload.lifecycle.start(TaskId::new(1)).await?;
    workload.hire(2, "Grace", 8);

    let summary = workload.roster.retire(EngineerId::new(1)).await?;
    ensure!(summary.requeued == vec![TaskId::new(1)]);

    let cycle = workload.engine.run_cycle().await?;
    ensure!(cycle.assignments == 1);
    let task = workload
        .store
        .find_task(TaskId::new(1))
        .await?
        .ok_or_eyre("task 1")?;
    ensure!(task.status() == TaskStatus::Pending);
    ensure!(task.assigned_engineer_id() == Some(EngineerId::new(2)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn estimate_reflects_assigned_engineer(workload: Workload) -> eyre::Result<()> {
    workload.hire(1, "Ada", 1);
    workload.add_task(1, "Schema migration", TaskPriority::Low);
    workload.engine.run_cycle().await?;

    let task = workload
        .store
        .find_task(TaskId::new(1))
        .await?
        .ok_or_eyre("task 1")?;
    let engineer_id = task.assigned_engineer_id().ok_or_eyre("task assigned")?;
    let engineer = workload
        .store
        .find_engineer(engineer_id)
        .await?
        .ok_or_eyre("engineer exists")?;
    let estimate = TaskEstimate::for_engineer(&task, &engineer);

    ensure!(estimate.to_string() == "2h 0m");
    ensure!(estimate.days_needed == 2);
    Ok(())
}
