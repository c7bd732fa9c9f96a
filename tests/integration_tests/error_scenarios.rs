//! Error scenario integration tests
//!
//! Tests failure modes that only show up with a misbehaving backend:
//! 1. Storage failures surface as 500 with the backend's message
//! 2. Invalid requests are rejected before the store is touched
//! 3. Slow requests are cut off by the request timeout

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use tower::ServiceExt;

use coasters::models::Coaster;
use coasters::server::{AppState, CoasterServer};
use coasters::storage::{CoasterStore, StoreError, StoreResult};

use crate::common::{
    body_string, coaster_json, empty_request, json_request, path, router_with_store, test_config,
};

/// Store that fails every call and counts how often it was reached
#[derive(Default)]
struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    fn fail<T>(&self) -> StoreResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::InvalidData("disk on fire".to_string()))
    }
}

#[async_trait]
impl CoasterStore for FailingStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        self.fail()
    }
    async fn get(&self, _id: &str) -> StoreResult<Option<Coaster>> {
        self.fail()
    }
    async fn put(&self, _id: &str, _coaster: Coaster) -> StoreResult<()> {
        self.fail()
    }
    async fn replace(&self, _id: &str, _coaster: Coaster) -> StoreResult<bool> {
        self.fail()
    }
    async fn delete(&self, _id: &str) -> StoreResult<bool> {
        self.fail()
    }
    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Store whose reads take longer than any sane timeout
struct SlowStore;

#[async_trait]
impl CoasterStore for SlowStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }
    async fn get(&self, _id: &str) -> StoreResult<Option<Coaster>> {
        Ok(None)
    }
    async fn put(&self, _id: &str, _coaster: Coaster) -> StoreResult<()> {
        Ok(())
    }
    async fn replace(&self, _id: &str, _coaster: Coaster) -> StoreResult<bool> {
        Ok(false)
    }
    async fn delete(&self, _id: &str) -> StoreResult<bool> {
        Ok(false)
    }
    fn backend_name(&self) -> &'static str {
        "slow"
    }
}

// ============================================================================
// Storage Failures
// ============================================================================

#[tokio::test]
async fn test_storage_failure_is_500_with_message() {
    let app = router_with_store(Arc::new(FailingStore::default()));

    let requests = vec![
        empty_request("GET", &path("/coasters")),
        empty_request("GET", &path("/coasters/c1")),
        empty_request("DELETE", &path("/coasters/c1")),
        empty_request("GET", &path("/coasters/random")),
        json_request("POST", &path("/coasters"), coaster_json("Loop", 50)),
        json_request("PUT", &path("/coasters/c1"), coaster_json("Loop", 50)),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected status for {uri}"
        );
        assert!(body_string(response).await.contains("disk on fire"));
    }
}

#[tokio::test]
async fn test_invalid_writes_never_reach_store() {
    let store = Arc::new(FailingStore::default());
    let app = router_with_store(store.clone());

    let response = app
        .clone()
        .oneshot(json_request("POST", &path("/coasters"), "not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = axum::http::Request::builder()
        .method("PUT")
        .uri(path("/coasters/c1"))
        .header("content-type", "application/xml")
        .body(axum::body::Body::from(coaster_json("Loop", 50)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_degrades_on_storage_failure() {
    let response = router_with_store(Arc::new(FailingStore::default()))
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["backend"], "failing");
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test]
async fn test_slow_request_times_out() {
    let mut config = test_config();
    config.server.request_timeout_secs = 1;
    let app = CoasterServer::from_state(AppState::new(config, Arc::new(SlowStore))).build_router();

    let response = app
        .oneshot(empty_request("GET", &path("/coasters")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
