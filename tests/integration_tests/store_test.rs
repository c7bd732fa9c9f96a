//! Store persistence tests
//!
//! - SQLite records survive reopening the database file
//! - Any accepted coaster reads back exactly as created (property test)
//! - Writes skip the record count while metrics are not initialized
//! - PostgreSQL round trip, run only when `TEST_DATABASE_URL` is set

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use coasters::models::Coaster;
use coasters::service::{CoasterService, JSON_CONTENT_TYPE};
use coasters::storage::{
    create_memory_store, create_postgres_store, create_sqlite_store, CoasterStore,
    MemoryCoasterStore, SqliteCoasterStore, StoreResult,
};

use crate::common::create_test_coaster;

#[tokio::test]
async fn test_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("coasters.db");

    let id = {
        let service = CoasterService::new(create_sqlite_store(&db_path).unwrap());
        let body = serde_json::to_vec(&create_test_coaster()).unwrap();
        service.create(Some(JSON_CONTENT_TYPE), &body).await.unwrap().id
    };

    let reopened = SqliteCoasterStore::new(&db_path).unwrap();
    let coaster = reopened.get(&id).await.unwrap().unwrap();
    assert_eq!(coaster.name, "Loop");
    assert_eq!(coaster.height, 50);
    assert_eq!(reopened.count().await.unwrap(), 1);
}

fn coaster_strategy() -> impl Strategy<Value = Coaster> {
    (
        ".{0,24}",
        "[A-Za-z ]{0,16}",
        "\\PC{0,16}",
        any::<i64>(),
    )
        .prop_map(|(name, manufacturer, in_park, height)| {
            Coaster::new(name, manufacturer, in_park, height)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_created_coaster_reads_back(coaster in coaster_strategy()) {
        let body = serde_json::to_vec(&coaster).unwrap();

        for store in [create_memory_store(), create_sqlite_store(":memory:").unwrap()] {
            let service = CoasterService::new(store);
            let (created, fetched) = tokio_test::block_on(async {
                let created = service.create(Some(JSON_CONTENT_TYPE), &body).await.unwrap();
                let fetched = service.get(&created.id).await.unwrap();
                (created, fetched)
            });

            prop_assert!(!created.id.is_empty());
            prop_assert!(fetched.same_content(&coaster));
            prop_assert_eq!(fetched, created);
        }
    }
}

/// Memory store that counts how often `count` is called
#[derive(Default)]
struct CountingStore {
    inner: MemoryCoasterStore,
    counts: AtomicUsize,
}

#[async_trait]
impl CoasterStore for CountingStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        self.inner.list().await
    }
    async fn get(&self, id: &str) -> StoreResult<Option<Coaster>> {
        self.inner.get(id).await
    }
    async fn put(&self, id: &str, coaster: Coaster) -> StoreResult<()> {
        self.inner.put(id, coaster).await
    }
    async fn replace(&self, id: &str, coaster: Coaster) -> StoreResult<bool> {
        self.inner.replace(id, coaster).await
    }
    async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.inner.delete(id).await
    }
    async fn count(&self) -> StoreResult<usize> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count().await
    }
    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

#[tokio::test]
async fn test_writes_skip_count_without_metrics() {
    // Nothing in this test binary registers metrics
    assert!(!coasters::metrics::metrics_initialized());

    let store = Arc::new(CountingStore::default());
    let service = CoasterService::new(store.clone());
    let body = serde_json::to_vec(&create_test_coaster()).unwrap();

    let created = service.create(Some(JSON_CONTENT_TYPE), &body).await.unwrap();
    service
        .update(&created.id, Some(JSON_CONTENT_TYPE), &body)
        .await
        .unwrap();
    service.delete(&created.id).await.unwrap();

    assert_eq!(store.counts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing at a PostgreSQL server"]
async fn test_postgres_round_trip() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        return;
    };

    let service = CoasterService::new(create_postgres_store(&url, 2).await.unwrap());
    let body = serde_json::to_vec(&create_test_coaster()).unwrap();
    let created = service.create(Some(JSON_CONTENT_TYPE), &body).await.unwrap();

    assert_eq!(service.get(&created.id).await.unwrap(), created);
    service.delete(&created.id).await.unwrap();
    assert!(service.get(&created.id).await.is_err());
}
