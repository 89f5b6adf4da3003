//! Runs the allocation scheduler over a JSON workload snapshot.
//!
//! Usage:
//!
//! ```text
//! allotment <snapshot-path>
//! ```
//!
//! The file at `snapshot-path` must deserialize into a
//! [`WorkloadSnapshot`]. A representative snapshot is:
//!
//! ```json
//! {
//!   "engineers": [
//!     {"id": 1, "name": "Ada", "daily_capacity_hours": 8, "efficiency_factor": 1.2}
//!   ],
//!   "tasks": [
//!     {
//!       "id": 10, "name": "Fix login", "priority": "high", "estimated_minutes": 90,
//!       "status": "pending", "assigned_engineer_id": null, "started_at": null,
//!       "completed_at": null, "last_started_at": null, "last_paused_at": null,
//!       "minutes_spent": 0
//!     }
//!   ]
//! }
//! ```
//!
//! Cycles run until the process receives Ctrl-C, after which the current
//! state is written back to the same file. The new contents are staged in a
//! sibling file and renamed over the snapshot.

use allotment::allocation::{AllocationEngine, AllocationScheduler};
use allotment::config::{AllotmentConfig, ConfigError};
use allotment::telemetry::{TelemetryError, init_tracing};
use allotment::workload::adapters::memory::{InMemoryWorkloadStore, WorkloadSnapshot};
use allotment::workload::ports::WorkloadStoreError;
use allotment::workload::services::TaskLifecycleService;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::DefaultClock;
use std::env;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;

const STAGING_SUFFIX: &str = ".saving";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum ServeError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to access snapshot {path}: {source}")]
    SnapshotIo {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed snapshot: {0}")]
    SnapshotFormat(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] WorkloadStoreError),
    #[error("runtime failure: {0}")]
    Runtime(#[source] io::Error),
}

/// Snapshot file reached through a capability on its parent directory.
struct SnapshotFile {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
}

impl SnapshotFile {
    fn open(path: &Utf8Path) -> Result<Self, ServeError> {
        let file_name = path.file_name().ok_or_else(|| {
            ServeError::InvalidArgs(format!("snapshot path {path} has no file name"))
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|source| {
            ServeError::SnapshotIo {
                path: path.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            dir,
            file_name: file_name.to_owned(),
            path: path.to_owned(),
        })
    }

    fn load(&self) -> Result<WorkloadSnapshot, ServeError> {
        let raw = self
            .dir
            .read_to_string(&self.file_name)
            .map_err(|source| self.io_error(source))?;
        serde_json::from_str(&raw).map_err(ServeError::SnapshotFormat)
    }

    fn save(&self, snapshot: &WorkloadSnapshot) -> Result<(), ServeError> {
        let encoded = serde_json::to_string_pretty(snapshot).map_err(ServeError::SnapshotFormat)?;
        let staging = format!("{}{STAGING_SUFFIX}", self.file_name);
        self.dir
            .write(&staging, encoded)
            .map_err(|source| self.io_error(source))?;
        self.dir
            .rename(&staging, &self.dir, &self.file_name)
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> ServeError {
        ServeError::SnapshotIo {
            path: self.path.clone(),
            source,
        }
    }
}

fn main() -> Result<(), BoxError> {
    let args = collect_args()?;
    let snapshot_path = parse_args(args.into_iter())?;
    let config = AllotmentConfig::from_env().map_err(ServeError::from)?;
    init_tracing(&config.log_level).map_err(ServeError::from)?;
    serve(&snapshot_path, &config).map_err(Into::into)
}

fn collect_args() -> Result<Vec<Utf8PathBuf>, ServeError> {
    env::args_os()
        .map(|arg_os| {
            let arg = arg_os
                .into_string()
                .map_err(|_| ServeError::InvalidArgs("argument is not valid UTF-8".into()))?;
            Ok(Utf8PathBuf::from(arg))
        })
        .collect()
}

fn parse_args(mut args: impl Iterator<Item = Utf8PathBuf>) -> Result<Utf8PathBuf, ServeError> {
    let _program = args.next();
    let path = args
        .next()
        .ok_or_else(|| ServeError::InvalidArgs("missing snapshot path argument".into()))?;
    if let Some(extra) = args.next() {
        return Err(ServeError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(path)
}

fn load_store(file: &SnapshotFile) -> Result<InMemoryWorkloadStore, ServeError> {
    let snapshot = file.load()?;
    info!(
        engineers = snapshot.engineers.len(),
        tasks = snapshot.tasks.len(),
        path = %file.path,
        "workload snapshot loaded"
    );
    Ok(InMemoryWorkloadStore::from_snapshot(snapshot)?)
}

fn serve(path: &Utf8Path, config: &AllotmentConfig) -> Result<(), ServeError> {
    let file = SnapshotFile::open(path)?;
    let store = Arc::new(load_store(&file)?);
    let lifecycle = TaskLifecycleService::new(Arc::clone(&store), Arc::new(DefaultClock));
    let engine = Arc::new(AllocationEngine::new(lifecycle, config.day_boundary));
    let scheduler = AllocationScheduler::new(engine, config.cycle_interval);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServeError::Runtime)?;
    runtime.block_on(async {
        let handle = scheduler.spawn();
        tokio::signal::ctrl_c().await.map_err(ServeError::Runtime)?;
        scheduler.shutdown();
        if let Err(err) = handle.await {
            return Err(ServeError::Runtime(io::Error::other(err)));
        }
        Ok(())
    })?;

    let stats = scheduler.stats();
    info!(
        completed = stats.completed,
        skipped = stats.skipped,
        failed = stats.failed,
        "allocation scheduler stopped"
    );
    file.save(&store.snapshot()?)?;
    info!(path = %file.path, "workload snapshot saved");
    Ok(())
}
