//! HTTP server wiring
//!
//! Builds the shared application state from a validated [`Config`], mounts
//! the API router and runs it with `axum::serve`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::Router;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin::AdminPortal;
use crate::api::create_router;
use crate::config::{Config, ServerConfig};
use crate::service::CoasterService;
use crate::storage::{
    create_memory_store, create_postgres_store, create_sqlite_store, SharedCoasterStore,
    StorageBackend,
};

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Resource service
    pub service: CoasterService,

    /// Admin credential check
    pub admin: Arc<AdminPortal>,

    /// Server start time
    pub start_time: Instant,

    /// Wall-clock start time, reported by the health endpoint
    pub started_at: DateTime<Utc>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble state around an already constructed store
    pub fn new(config: Config, store: SharedCoasterStore) -> Self {
        let service = CoasterService::new(store)
            .with_id_generator(config.service.id_strategy.generator())
            .with_api_prefix(config.server.api_prefix.clone());

        Self {
            service,
            admin: Arc::new(AdminPortal::new(&config.admin)),
            start_time: Instant::now(),
            started_at: Utc::now(),
            config: Arc::new(config),
        }
    }

    /// Replace the resource service
    #[must_use]
    pub fn with_service(mut self, service: CoasterService) -> Self {
        self.service = service;
        self
    }
}

// ============================================================================
// Coaster Server
// ============================================================================

/// Main HTTP server
pub struct CoasterServer {
    config: ServerConfig,
    state: AppState,
}

impl CoasterServer {
    /// Create a server, opening the configured storage backend
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let store = open_store(&config).await?;
        tracing::info!(backend = store.backend_name(), "Coaster store ready");

        Ok(Self::from_state(AppState::new(config, store)))
    }

    /// Create a server around prepared state
    pub fn from_state(state: AppState) -> Self {
        Self {
            config: state.config.server.clone(),
            state,
        }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        let timeout = TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(self.config.request_timeout_secs),
        );
        router = router.layer(timeout);

        // Add CORS layer if enabled
        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting coaster server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting coaster server on {} (with graceful shutdown)", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Coaster server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            api_prefix: self.config.api_prefix.clone(),
            backend: self.state.service.store().backend_name(),
            request_timeout_secs: self.config.request_timeout_secs,
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

async fn open_store(config: &Config) -> Result<SharedCoasterStore, ServerError> {
    let storage = &config.storage;
    let store = match storage.backend {
        StorageBackend::Memory => create_memory_store(),
        StorageBackend::Sqlite => create_sqlite_store(&storage.sqlite_path)
            .map_err(|e| ServerError::Init(e.to_string()))?,
        StorageBackend::Postgres => {
            let url = storage.postgres_url.as_deref().ok_or_else(|| {
                ServerError::Config("storage.postgres_url is required".to_string())
            })?;
            create_postgres_store(url, storage.pool_size)
                .await
                .map_err(|e| ServerError::Init(e.to_string()))?
        }
    };
    Ok(store)
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub api_prefix: String,
    pub backend: &'static str,
    pub request_timeout_secs: u64,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Coaster Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             API Prefix: {}\n\
             Storage Backend: {}\n\
             Request Timeout: {}s\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            if self.api_prefix.is_empty() { "/" } else { &self.api_prefix },
            self.backend,
            self.request_timeout_secs,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    Bind(String),

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}

// ============================================================================
// Tests
// ============================================================================
