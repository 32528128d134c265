//! Common test utilities for board-backup integration tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod service;

#[allow(unused_imports)]
pub use fixtures::*;
pub use service::*;
