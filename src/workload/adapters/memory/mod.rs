//! In-memory adapter implementations for the workload ports.

mod store;

pub use store::{InMemoryWorkloadStore, WorkloadSnapshot};
