//! Integration tests module
//!
//! End-to-end tests for the quiz generator, including:
//! - Complete rotate → render → publish runs
//! - Rotation of a previous day's set into the archive
//! - Backend, feed and storage failure handling

pub mod archive_test;
pub mod pipeline_test;
