//! Integration tests module
//!
//! This module provides end-to-end integration tests for the coaster service,
//! including:
//! - HTTP API behaviour through the full router
//! - Concurrent access to every local storage backend
//! - Error handling with misbehaving stores

pub mod concurrency_test;
pub mod error_scenarios;
pub mod store_test;
