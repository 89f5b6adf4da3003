//! Allotment: engineer task allocation and time tracking.
//!
//! This crate assigns tasks to engineers under a priority policy and a
//! per-engineer daily capacity limit, and tracks each task's working time
//! through explicit start, pause, and complete transitions.
//!
//! # Architecture
//!
//! Allotment follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`workload`]: Engineer and task records, the lifecycle state machine,
//!   and the workload store port
//! - [`allocation`]: Periodic reassignment and daily capacity enforcement
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod allocation;
pub mod config;
pub mod telemetry;
pub mod workload;
