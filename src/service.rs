//! Resource service for coaster records
//!
//! Turns HTTP-level intents into store calls and decides the outcome of each
//! one. Validation (content type, then body shape) always happens before the
//! store is touched, so a rejected request never mutates anything.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::ids::{SharedIdGenerator, TimestampIdGenerator};
use crate::metrics;
use crate::models::Coaster;
use crate::selector::RandomSelector;
use crate::storage::{SharedCoasterStore, StoreError};

/// The only content type accepted on writes
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Body returned when an id does not resolve to a record
pub const NOT_FOUND_MESSAGE: &str = "Coaster Not Found!";

/// Body returned when a random pick is requested from an empty store
pub const NO_COASTERS_MESSAGE: &str = "No Coasters Found!";

/// Body returned after a successful delete
pub const DELETED_MESSAGE: &str = "Coaster Deleted!";

// ============================================================================
// Service Errors
// ============================================================================

/// Outcome of a failed service operation
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Write request without `content-type: application/json`
    #[error("Need content-type 'application/json' but got '{got}'")]
    UnsupportedMediaType { got: String },

    /// Body did not decode into a coaster
    #[error("{0}")]
    MalformedBody(String),

    /// No record under the requested id
    #[error("Coaster Not Found!")]
    NotFound,

    /// Random pick requested while the store is empty
    #[error("No Coasters Found!")]
    NoCoasters,

    /// Backend failure, reported with the backend's own text
    #[error("{0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    /// HTTP status code for this outcome
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::NoCoasters => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client caused this failure
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Result type for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

// ============================================================================
// Coaster Service
// ============================================================================

/// Orchestrates validation, id assignment and store access
#[derive(Clone)]
pub struct CoasterService {
    store: SharedCoasterStore,
    ids: SharedIdGenerator,
    selector: Arc<RandomSelector>,
    api_prefix: String,
}

impl CoasterService {
    /// Create a service with the default generator and an entropy-seeded selector
    pub fn new(store: SharedCoasterStore) -> Self {
        Self {
            store,
            ids: Arc::new(TimestampIdGenerator::new()),
            selector: Arc::new(RandomSelector::new()),
            api_prefix: String::new(),
        }
    }

    /// Replace the identifier generator
    #[must_use]
    pub fn with_id_generator(mut self, ids: SharedIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the random selector
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<RandomSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Set the path prefix used when building `Location` headers
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Access the underlying store
    pub fn store(&self) -> &SharedCoasterStore {
        &self.store
    }

    /// Path of the resource for `id`
    pub fn location_for(&self, id: &str) -> String {
        format!("{}/coasters/{}", self.api_prefix, id)
    }

    /// List every coaster
    pub async fn list(&self) -> ServiceResult<Vec<Coaster>> {
        let coasters = self.store.list().await.map_err(storage_failure)?;
        metrics::set_stored_records(coasters.len());
        Ok(coasters)
    }

    /// Fetch one coaster
    pub async fn get(&self, id: &str) -> ServiceResult<Coaster> {
        match self.store.get(id).await.map_err(storage_failure)? {
            Some(coaster) => Ok(coaster),
            None => {
                tracing::debug!(id = %id, "Coaster not found");
                Err(ServiceError::NotFound)
            }
        }
    }

    /// Create a coaster from a raw request
    ///
    /// Any `id` in the body is discarded in favour of a generated one.
    pub async fn create(&self, content_type: Option<&str>, body: &[u8]) -> ServiceResult<Coaster> {
        let coaster = decode_body(content_type, body)?;

        let id = self.ids.next_id();
        let coaster = coaster.with_id(id.clone());
        self.store
            .put(&id, coaster.clone())
            .await
            .map_err(storage_failure)?;

        tracing::info!(id = %id, name = %coaster.name, "Coaster created");
        self.refresh_record_count().await;
        Ok(coaster)
    }

    /// Replace an existing coaster from a raw request
    ///
    /// The path id always wins over any `id` in the body.
    pub async fn update(
        &self,
        id: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> ServiceResult<Coaster> {
        let coaster = decode_body(content_type, body)?.with_id(id);

        let existed = self
            .store
            .replace(id, coaster.clone())
            .await
            .map_err(storage_failure)?;

        if !existed {
            tracing::debug!(id = %id, "Update target not found");
            return Err(ServiceError::NotFound);
        }

        tracing::info!(id = %id, "Coaster updated");
        Ok(coaster)
    }

    /// Delete a coaster
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let removed = self.store.delete(id).await.map_err(storage_failure)?;
        if !removed {
            tracing::debug!(id = %id, "Delete target not found");
            return Err(ServiceError::NotFound);
        }

        tracing::info!(id = %id, "Coaster deleted");
        self.refresh_record_count().await;
        Ok(())
    }

    /// Pick a uniformly random existing id
    pub async fn random_id(&self) -> ServiceResult<String> {
        let ids = self.store.ids().await.map_err(storage_failure)?;
        self.selector.pick(&ids).ok_or(ServiceError::NoCoasters)
    }

    /// `Location` target for the random-coaster redirect
    pub async fn random_location(&self) -> ServiceResult<String> {
        let id = self.random_id().await?;
        Ok(self.location_for(&id))
    }

    async fn refresh_record_count(&self) {
        if !metrics::metrics_initialized() {
            return;
        }
        match self.store.count().await {
            Ok(count) => metrics::set_stored_records(count),
            Err(e) => tracing::warn!(error = %e, "Failed to count coasters"),
        }
    }
}

/// Reject any write whose content type is not exactly `application/json`
///
/// Callers run this before reading the request body at all.
pub fn check_content_type(content_type: Option<&str>) -> ServiceResult<()> {
    let content_type = content_type.unwrap_or("");
    if content_type != JSON_CONTENT_TYPE {
        return Err(ServiceError::UnsupportedMediaType {
            got: content_type.to_string(),
        });
    }
    Ok(())
}

/// Check the content type, then decode the body
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> ServiceResult<Coaster> {
    check_content_type(content_type)?;
    Coaster::from_json(body).map_err(|e| ServiceError::MalformedBody(e.to_string()))
}

fn storage_failure(err: StoreError) -> ServiceError {
    tracing::error!(error = %err, "Coaster store operation failed");
    ServiceError::Storage(err)
}

// ============================================================================
// Tests
// ============================================================================
