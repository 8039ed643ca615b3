//! Shared test utilities for docscan integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated scans against a temp directory and database
//! - Builders for configurations
//! - Scriptable extractor, classifier and store doubles

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
