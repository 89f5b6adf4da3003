//! Engineer and task workload management.
//!
//! This module owns the task lifecycle state machine (start, pause, complete)
//! and the per-engineer daily minute accounting it drives. It follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
