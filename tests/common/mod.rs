//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use coasters::config::Config;
use coasters::ids::SequentialIdGenerator;
use coasters::models::Coaster;
use coasters::server::{AppState, CoasterServer};
use coasters::service::CoasterService;
use coasters::storage::{create_memory_store, SharedCoasterStore};

pub const ADMIN_PASSWORD: &str = "letmein";
pub const API_PREFIX: &str = "/api/v1";

/// Configuration that passes validation
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.admin.password = ADMIN_PASSWORD.to_string();
    config
}

/// Router over the given store, with predictable ids ("c1", "c2", ...)
pub fn router_with_store(store: SharedCoasterStore) -> Router {
    let config = test_config();
    let service = CoasterService::new(store)
        .with_id_generator(Arc::new(SequentialIdGenerator::new("c")))
        .with_api_prefix(config.server.api_prefix.clone());
    let state = AppState::new(config, create_memory_store()).with_service(service);
    CoasterServer::from_state(state).build_router()
}

/// Router over a fresh in-memory store
pub fn test_router() -> Router {
    router_with_store(create_memory_store())
}

/// Create a test coaster with default values
pub fn create_test_coaster() -> Coaster {
    Coaster::new("Loop", "Acme", "Six Flags", 50)
}

/// JSON body for a coaster, without an id
pub fn coaster_json(name: &str, height: i64) -> String {
    format!(
        r#"{{"name":"{name}","manufacturer":"Acme","in_park":"Six Flags","height":{height}}}"#
    )
}

pub fn path(suffix: &str) -> String {
    format!("{API_PREFIX}{suffix}")
}

pub fn json_request(method: &str, uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn basic_auth(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_coaster(response: Response<Body>) -> Coaster {
    serde_json::from_str(&body_string(response).await).unwrap()
}
