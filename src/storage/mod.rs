//! Coaster persistence
//!
//! The service only ever talks to [`CoasterStore`]; which backend sits behind
//! it (process memory, SQLite, PostgreSQL) is decided once at startup.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryCoasterStore;
pub use postgres::PostgresCoasterStore;
pub use repository::{
    create_memory_store, create_postgres_store, create_sqlite_store, CoasterStore,
    SharedCoasterStore, StorageBackend,
};
pub use sqlite::SqliteCoasterStore;
