//! REST API handlers for the coaster service
//!
//! Handlers stay thin: they pull the raw request parts out with axum
//! extractors, hand them to [`CoasterService`](crate::service::CoasterService)
//! and render the outcome. Error bodies are plain text.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;

use crate::admin::{ADMIN_GREETING, UNAUTHORIZED_MESSAGE};
use crate::metrics;
use crate::models::Coaster;
use crate::server::AppState;
use crate::service::{
    check_content_type, decode_body, ServiceError, ServiceResult, DELETED_MESSAGE,
};

/// Content type of the Prometheus text exposition format
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Largest request body accepted on create and replace
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Path segment that PUT and DELETE on the random route treat as an id
const RANDOM_SEGMENT: &str = "random";

// ============================================================================
// API Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub started_at: String,
    pub backend: String,
    pub records: Option<usize>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let prefix = state.config.server.api_prefix.clone();

    Router::new()
        // Coaster endpoints
        .route(
            &format!("{prefix}/coasters"),
            get(list_coasters).post(create_coaster),
        )
        .route(
            &format!("{prefix}/coasters/random"),
            get(random_coaster)
                .put(update_random_segment)
                .delete(delete_random_segment),
        )
        .route(
            &format!("{prefix}/coasters/{{id}}"),
            get(get_coaster).put(update_coaster).delete(delete_coaster),
        )
        // Admin portal
        .route(&format!("{prefix}/admin"), any(admin_portal))
        // Operational endpoints
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}

/// Record the request in metrics and pass the response through
fn observed(operation: &str, started: Instant, response: Response) -> Response {
    metrics::record_api_request(
        operation,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// An id segment that cannot be decoded names no stored coaster
fn path_id(path: Result<Path<String>, PathRejection>) -> Option<String> {
    match path {
        Ok(Path(id)) => Some(id),
        Err(rejection) => {
            tracing::debug!(%rejection, "Undecodable coaster id");
            None
        }
    }
}

/// Check the content type, then buffer the body up to [`MAX_BODY_BYTES`]
///
/// The body is never read when the content type is wrong.
async fn read_json_body(
    headers: &HeaderMap,
    body: Body,
) -> ServiceResult<(Option<String>, Bytes)> {
    let content_type = content_type(headers);
    check_content_type(content_type.as_deref())?;
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ServiceError::MalformedBody(e.to_string()))?;
    Ok((content_type, bytes))
}

// ============================================================================
// Coaster Handlers
// ============================================================================

/// List every coaster
async fn list_coasters(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let response = match state.service.list().await {
        Ok(coasters) => Json(coasters).into_response(),
        Err(e) => e.into_response(),
    };
    observed("list", started, response)
}

/// Get a single coaster
async fn get_coaster(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let started = Instant::now();
    let result = match path_id(path) {
        Some(id) => state.service.get(&id).await,
        None => Err(ServiceError::NotFound),
    };
    let response = match result {
        Ok(coaster) => Json(coaster).into_response(),
        Err(e) => e.into_response(),
    };
    observed("get", started, response)
}

/// Create a coaster
async fn create_coaster(State(state): State<AppState>, headers: HeaderMap, body: Body) -> Response {
    let started = Instant::now();
    let result = match read_json_body(&headers, body).await {
        Ok((content_type, bytes)) => state.service.create(content_type.as_deref(), &bytes).await,
        Err(e) => Err(e),
    };
    let response = match result {
        Ok(coaster) => (StatusCode::CREATED, Json(coaster)).into_response(),
        Err(e) => e.into_response(),
    };
    observed("create", started, response)
}

/// Validate the body, then replace the coaster under `id`
///
/// Body errors win over a missing coaster, so an undecodable id still
/// answers 415 or 400 for a bad body before it answers 404.
async fn replace_coaster(
    state: &AppState,
    id: Option<&str>,
    headers: &HeaderMap,
    body: Body,
) -> ServiceResult<Coaster> {
    let (content_type, bytes) = read_json_body(headers, body).await?;
    match id {
        Some(id) => state.service.update(id, content_type.as_deref(), &bytes).await,
        None => {
            decode_body(content_type.as_deref(), &bytes)?;
            Err(ServiceError::NotFound)
        }
    }
}

fn update_response(result: ServiceResult<Coaster>) -> Response {
    match result {
        Ok(coaster) => Json(coaster).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a coaster
async fn update_coaster(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let started = Instant::now();
    let id = path_id(path);
    let result = replace_coaster(&state, id.as_deref(), &headers, body).await;
    observed("update", started, update_response(result))
}

/// PUT on the random route is a replace of the id `random`
async fn update_random_segment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let started = Instant::now();
    let result = replace_coaster(&state, Some(RANDOM_SEGMENT), &headers, body).await;
    observed("update", started, update_response(result))
}

async fn remove_coaster(state: &AppState, id: Option<&str>) -> Response {
    let result = match id {
        Some(id) => state.service.delete(id).await,
        None => Err(ServiceError::NotFound),
    };
    match result {
        Ok(()) => (StatusCode::OK, DELETED_MESSAGE).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a coaster
async fn delete_coaster(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let started = Instant::now();
    let id = path_id(path);
    let response = remove_coaster(&state, id.as_deref()).await;
    observed("delete", started, response)
}

/// DELETE on the random route is a delete of the id `random`
async fn delete_random_segment(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let response = remove_coaster(&state, Some(RANDOM_SEGMENT)).await;
    observed("delete", started, response)
}

/// Redirect to a random coaster
async fn random_coaster(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let response = match state.service.random_location().await {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(e) => e.into_response(),
    };
    observed("random", started, response)
}

// ============================================================================
// Admin Handler
// ============================================================================

/// Basic-auth guarded admin page
async fn admin_portal(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let response = match state.admin.authorize(authorization) {
        Ok(()) => (StatusCode::OK, ADMIN_GREETING).into_response(),
        Err(e) => {
            tracing::warn!(reason = %e, "Admin authentication failed");
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"admin\"")],
                UNAUTHORIZED_MESSAGE,
            )
                .into_response()
        }
    };
    observed("admin", started, response)
}

// ============================================================================
// Operational Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.service.store();
    let records = match store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not count coasters");
            None
        }
    };

    let status = if records.is_some() { "healthy" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        backend: store.backend_name().to_string(),
        records,
    })
}

/// Prometheus scrape endpoint
async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
