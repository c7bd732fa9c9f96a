//! Repository Pattern for Coaster Storage
//!
//! This module defines the [`CoasterStore`] trait that decouples the
//! resource service from the concrete storage backend, enabling:
//! - In-process storage guarded by a reader/writer lock
//! - Swappable database backends (SQLite, PostgreSQL)
//! - Tests that never touch a database
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CoasterService                           │
//! │        (validation, id assignment, status mapping)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CoasterStore trait                        │
//! │       list / get / put / replace / delete                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Memory      │ │     SQLite      │ │   PostgreSQL    │
//! │  (RwLock map)   │ │ (blocking pool) │ │ (deadpool)      │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! # Atomicity
//!
//! Every method is atomic with respect to every other method on the same
//! store: no caller ever observes a record with some fields from an old
//! value and some from a new one. Records are handed out by value.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreResult;
use super::memory::MemoryCoasterStore;
use super::postgres::PostgresCoasterStore;
use super::sqlite::SqliteCoasterStore;
use crate::models::Coaster;

// ============================================================================
// Repository Trait
// ============================================================================

/// Keyed collection of coaster records with safe concurrent access
#[async_trait]
pub trait CoasterStore: Send + Sync {
    /// Snapshot of every record, in no particular order
    async fn list(&self) -> StoreResult<Vec<Coaster>>;

    /// Exact-key lookup
    async fn get(&self, id: &str) -> StoreResult<Option<Coaster>>;

    /// Insert or fully replace the record at `id`
    ///
    /// The stored record always carries `id`, whatever `coaster.id` says.
    async fn put(&self, id: &str, coaster: Coaster) -> StoreResult<()>;

    /// Replace the record at `id` only if one exists
    ///
    /// Returns whether a record was present. Unlike a `get` followed by a
    /// `put`, a concurrent delete can never be undone by this call.
    async fn replace(&self, id: &str, coaster: Coaster) -> StoreResult<bool>;

    /// Remove the record at `id`, returning whether it existed
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Identifiers of every record
    async fn ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.list().await?.into_iter().map(|c| c.id).collect())
    }

    /// Number of stored records
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.list().await?.len())
    }

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Thread-safe shared store
pub type SharedCoasterStore = Arc<dyn CoasterStore>;

// ============================================================================
// Backend Selection
// ============================================================================

/// Storage backends selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!(
                "unknown storage backend '{other}' (expected memory, sqlite or postgres)"
            )),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create a shared in-memory store
pub fn create_memory_store() -> SharedCoasterStore {
    Arc::new(MemoryCoasterStore::new())
}

/// Create a shared SQLite store at `path`
pub fn create_sqlite_store(path: impl AsRef<Path>) -> StoreResult<SharedCoasterStore> {
    let store = SqliteCoasterStore::new(path)?;
    Ok(Arc::new(store))
}

/// Create a shared PostgreSQL store
pub async fn create_postgres_store(url: &str, pool_size: usize) -> StoreResult<SharedCoasterStore> {
    let store = PostgresCoasterStore::connect(url, pool_size).await?;
    Ok(Arc::new(store))
}

// ============================================================================
// Tests
// ============================================================================
