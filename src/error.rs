//! Unified error handling for the coasters crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`CoasterErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use coasters::error::{CoasterErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err);
//!     } else {
//!         eprintln!("Fatal error ({}): {}", err.category(), err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::admin::AuthError;
pub use crate::config::ConfigError;
pub use crate::server::ServerError;
pub use crate::service::ServiceError;
pub use crate::storage::StoreError;

/// Common trait for all coasters error types
pub trait CoasterErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad content type or request body
    Validation,
    /// Missing record
    NotFound,
    /// Storage and I/O errors
    Storage,
    /// Admin credential failures
    Auth,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Auth => "auth",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoasterErrorTrait for StoreError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl CoasterErrorTrait for ServiceError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedMediaType { .. } | Self::MalformedBody(_) => {
                ErrorCategory::Validation
            }
            Self::NotFound | Self::NoCoasters => ErrorCategory::NotFound,
            Self::Storage(_) => ErrorCategory::Storage,
        }
    }
}

/// Unified error type for the coasters crate
#[derive(Error, Debug)]
pub enum Error {
    /// Resource service outcomes
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Storage backend failures
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Admin authentication failures
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CoasterErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Service(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Server(ServerError::Bind(_)) => true,
            Self::Auth(_) | Self::Config(_) | Self::Server(_) | Self::Json(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Service(e) => e.category(),
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Auth(_) => ErrorCategory::Auth,
            Self::Config(_) => ErrorCategory::Config,
            Self::Json(_) => ErrorCategory::Validation,
            Self::Server(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
