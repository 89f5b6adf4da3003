//! Unit tests for the allocation module.

mod capacity_tests;
