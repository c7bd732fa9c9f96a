//! Storage error types

use thiserror::Error;

/// Errors raised by a coaster store backend
///
/// The display text is what clients see with a 500 response, so variants
/// carry the backend's own message.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL failure
    #[error("{0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Could not obtain a pooled PostgreSQL connection
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Could not build the PostgreSQL connection pool
    #[error("connection pool setup failed: {0}")]
    PoolSetup(#[from] deadpool_postgres::CreatePoolError),

    /// Blocking storage task panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A previous panic poisoned the connection lock
    #[error("storage lock poisoned")]
    Poisoned,

    /// Filesystem failure while opening a store
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be represented in the model
    #[error("invalid stored value: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether retrying the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Postgres(_) | Self::Task(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
