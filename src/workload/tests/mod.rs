//! Unit tests for the workload module.
//!
//! Tests are organised by layer: domain rules, the in-memory store, and the
//! lifecycle and roster services.

pub(crate) mod support;
