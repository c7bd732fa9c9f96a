//! Configuration management for the coaster service
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. The result is validated once at startup and
//! treated as immutable afterwards.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::ids::IdStrategy;
use crate::storage::StorageBackend;

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "COASTERS_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Storage backend configuration
    pub storage: StorageConfig,

    /// Resource service configuration
    pub service: ServiceConfig,

    /// Admin portal credential
    pub admin: AdminConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Path prefix for every API route (empty or `/something`)
    pub api_prefix: String,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Enable per-request tracing spans
    pub enable_request_logging: bool,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend holds the records
    pub backend: StorageBackend,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// PostgreSQL connection string
    pub postgres_url: Option<String>,

    /// Maximum PostgreSQL pool size
    pub pool_size: usize,
}

/// Resource service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How new coaster ids are generated
    pub id_strategy: IdStrategy,
}

/// Admin portal credential
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8081)),
            api_prefix: String::from("/api/v1"),
            enable_cors: true,
            enable_request_logging: true,
            request_timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sqlite_path: PathBuf::from("data/coasters.db"),
            postgres_url: None,
            pool_size: 10,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: String::from("admin"),
            password: String::new(),
        }
    }
}

// The password must never end up in logs.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then `path` (or `COASTERS_CONFIG`), then environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, file and environment without validating the result
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let path = path.map(Path::to_path_buf).or(env_path);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            reason: format!("{}: {e}", path.display()),
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("COASTERS_BIND_ADDRESS") {
            self.server.bind_address = addr.parse().map_err(|_| ConfigError::InvalidValue {
                field: "server.bind_address".to_string(),
                reason: format!("Invalid address: {addr}"),
            })?;
        }

        if let Some(prefix) = lookup("COASTERS_API_PREFIX") {
            self.server.api_prefix = prefix;
        }

        if let Some(backend) = lookup("COASTERS_STORAGE_BACKEND") {
            self.storage.backend = backend.parse().map_err(|reason| ConfigError::InvalidValue {
                field: "storage.backend".to_string(),
                reason,
            })?;
        }

        if let Some(path) = lookup("COASTERS_SQLITE_PATH") {
            self.storage.sqlite_path = PathBuf::from(path);
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.postgres_url = Some(url);
        }

        if let Some(strategy) = lookup("COASTERS_ID_STRATEGY") {
            self.service.id_strategy =
                strategy.parse().map_err(|reason| ConfigError::InvalidValue {
                    field: "service.id_strategy".to_string(),
                    reason,
                })?;
        }

        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.admin.password = password;
        }

        if let Some(level) = lookup("COASTERS_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("COASTERS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.password.is_empty() {
            return Err(ConfigError::MissingField {
                field: "admin.password (ADMIN_PASSWORD)".to_string(),
            });
        }

        if self.admin.username.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "admin.username".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let prefix = &self.server.api_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(ConfigError::InvalidValue {
                field: "server.api_prefix".to_string(),
                reason: format!("'{prefix}' must start with '/' and not end with '/'"),
            });
        }

        if self.storage.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.pool_size".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.storage.backend == StorageBackend::Postgres && self.storage.postgres_url.is_none() {
            return Err(ConfigError::MissingField {
                field: "storage.postgres_url (DATABASE_URL)".to_string(),
            });
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format".to_string(),
                reason: format!("'{}' is not one of text, json", self.logging.format),
            });
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

// ============================================================================
// Server Config Builder
// ============================================================================

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_address: Option<SocketAddr>,
    api_prefix: Option<String>,
    enable_cors: Option<bool>,
    enable_request_logging: Option<bool>,
    request_timeout_secs: Option<u64>,
}

impl ServerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(addr.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_address".to_string(),
            reason: format!("Invalid address: {addr}"),
        })?);
        Ok(self)
    }

    /// Set API prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    /// Enable/disable CORS
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = Some(enable);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Set request timeout
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the config
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            api_prefix: self.api_prefix.unwrap_or(defaults.api_prefix),
            enable_cors: self.enable_cors.unwrap_or(defaults.enable_cors),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}

// ============================================================================
// Config Errors
// ============================================================================

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {reason}")]
    Parse { reason: String },
}
