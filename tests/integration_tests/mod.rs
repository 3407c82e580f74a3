//! Integration tests module
//!
//! End-to-end tests for hubstats, including:
//! - Trends, distributions and growth against a real bound engine
//! - Snapshot fetch → decode → bind from files and HTTP
//! - Error propagation from sources and engines
//! - The dashboard API over a live listener

pub mod analytics_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod server_test;
