//! coasters - REST service for roller coaster records
//!
//! A small resource service: create, read, replace and delete coaster records,
//! jump to a random one, and a Basic-auth guarded admin page.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - The `Coaster` record
//! - [`ids`] - Identifier generation strategies
//! - [`selector`] - Uniform random selection of an existing id
//! - [`storage`] - Record stores (memory, SQLite, PostgreSQL)
//! - [`service`] - Validation and outcome mapping for each operation
//! - [`admin`] - Admin credential check
//! - [`api`] / [`server`] - HTTP routes and server wiring
//! - [`metrics`] - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use coasters::config::Config;
//! use coasters::server::CoasterServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let server = CoasterServer::new(config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod models;
pub mod selector;
pub mod server;
pub mod service;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{CoasterErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::Coaster;
    pub use crate::server::{AppState, CoasterServer};
    pub use crate::service::{CoasterService, ServiceError};
    pub use crate::storage::{CoasterStore, SharedCoasterStore, StorageBackend};
}

// Direct re-exports for convenience
pub use models::Coaster;
