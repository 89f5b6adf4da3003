//! Adapter implementations for workload ports.

pub mod memory;
