//! Integration tests for end-to-end functionality
//!
//! Tests for:
//! - Complete runs over a directory of logs
//! - Per-file failure isolation
//! - Wide-table export

pub mod export_tests;
