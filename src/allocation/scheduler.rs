//! Periodic trigger for allocation cycles.

use crate::workload::ports::WorkloadStore;
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::{AllocationEngine, AllocationError};

/// Counters kept by a running scheduler.
#[derive(Debug, Default)]
struct SchedulerStats {
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatsSnapshot {
    /// Cycles that ran to completion.
    pub completed: u64,
    /// Ticks dropped because a cycle was still running.
    pub skipped: u64,
    /// Cycles aborted by a store failure.
    pub failed: u64,
}

/// Calls [`AllocationEngine::run_cycle`] on a fixed cadence.
///
/// Ticks that fall due while a cycle is still running are skipped rather
/// than queued, so trigger cadence never stacks cycles.
pub struct AllocationScheduler<S, C>
where
    S: WorkloadStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    engine: Arc<AllocationEngine<S, C>>,
    period: Duration,
    shutdown: Arc<Notify>,
    stats: Arc<SchedulerStats>,
}

impl<S, C> Clone for AllocationScheduler<S, C>
where
    S: WorkloadStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            period: self.period,
            shutdown: Arc::clone(&self.shutdown),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S, C> AllocationScheduler<S, C>
where
    S: WorkloadStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler that triggers `engine` every `period`.
    ///
    /// A zero period is raised to one millisecond.
    #[must_use]
    pub fn new(engine: Arc<AllocationEngine<S, C>>, period: Duration) -> Self {
        Self {
            engine,
            period: period.max(Duration::from_millis(1)),
            shutdown: Arc::new(Notify::new()),
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// Signals the scheduler loop to stop after the current cycle.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Returns the scheduler counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            completed: self.stats.completed.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Spawns the scheduler loop on the current runtime.
    #[must_use]
    pub fn spawn(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run().await })
    }

    /// Runs the scheduler loop until [`Self::shutdown`] is called.
    ///
    /// The first cycle runs immediately.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period = ?self.period, "allocation scheduler started");

        loop {
            tokio::select! {
                () = self.shutdown.notified() => {
                    info!("allocation scheduler shutting down");
                    return;
                }
                _ = ticker.tick() => self.trigger().await,
            }
        }
    }

    async fn trigger(&self) {
        match self.engine.run_cycle().await {
            Ok(_) => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(AllocationError::CycleInProgress) => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                warn!("allocation tick skipped, previous cycle still running");
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %err, "allocation cycle failed, next tick retries");
            }
        }
    }
}
