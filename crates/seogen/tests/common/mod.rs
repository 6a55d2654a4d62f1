//! Shared test utilities for seogen integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against a temp-dir SQLite database
//! - Builder patterns for creating test configurations programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FlakyStore, TestHarness};
