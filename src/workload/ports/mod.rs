//! Port contracts for workload persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the lifecycle and
//! allocation services.

pub mod store;

pub use store::{ActiveTaskCapacity, WorkloadStore, WorkloadStoreError, WorkloadStoreResult};
