//! Common test utilities for newsstore integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
