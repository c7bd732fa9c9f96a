//! Concurrency and distribution tests
//!
//! Exercises the service under parallel load against each local backend:
//! 1. Concurrent creates never collide on ids
//! 2. Readers never observe a half-written record
//! 3. Random selection is uniform over existing ids

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use coasters::ids::TimestampIdGenerator;
use coasters::selector::RandomSelector;
use coasters::service::{CoasterService, JSON_CONTENT_TYPE};
use coasters::storage::{create_memory_store, create_sqlite_store, SharedCoasterStore};

use crate::common::coaster_json;

fn stores() -> Vec<(SharedCoasterStore, Option<tempfile::TempDir>)> {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = create_sqlite_store(dir.path().join("coasters.db")).unwrap();
    vec![(create_memory_store(), None), (sqlite, Some(dir))]
}

// ============================================================================
// Identifier Uniqueness
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_ids() {
    for (store, _dir) in stores() {
        let backend = store.backend_name();
        let service =
            CoasterService::new(store).with_id_generator(Arc::new(TimestampIdGenerator::new()));

        let tasks = (0..200).map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(Some(JSON_CONTENT_TYPE), coaster_json("Ride", i).as_bytes())
                    .await
                    .unwrap()
                    .id
            })
        });

        let ids: Vec<String> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let unique: HashSet<_> = ids.iter().collect();

        assert_eq!(unique.len(), 200, "duplicate ids on {backend}");
        assert_eq!(service.list().await.unwrap().len(), 200, "lost writes on {backend}");
    }
}

// ============================================================================
// Snapshot Consistency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_never_sees_torn_records() {
    const VERSION_A: &str =
        r#"{"name":"A","manufacturer":"Maker A","in_park":"Park A","height":1}"#;
    const VERSION_B: &str =
        r#"{"name":"B","manufacturer":"Maker B","in_park":"Park B","height":2}"#;

    for (store, _dir) in stores() {
        let service = CoasterService::new(store);
        let id = service
            .create(Some(JSON_CONTENT_TYPE), VERSION_A.as_bytes())
            .await
            .unwrap()
            .id;

        let writer = {
            let service = service.clone();
            let id = id.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let body = if i % 2 == 0 { VERSION_B } else { VERSION_A };
                    service
                        .update(&id, Some(JSON_CONTENT_TYPE), body.as_bytes())
                        .await
                        .unwrap();
                }
            })
        };

        let readers = (0..4).map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    for coaster in service.list().await.unwrap() {
                        let consistent = match coaster.name.as_str() {
                            "A" => coaster.manufacturer == "Maker A" && coaster.height == 1,
                            "B" => coaster.manufacturer == "Maker B" && coaster.height == 2,
                            _ => false,
                        };
                        assert!(consistent, "torn record: {coaster:?}");
                    }
                }
            })
        });

        writer.await.unwrap();
        for reader in join_all(readers).await {
            reader.unwrap();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_update_racing_delete_does_not_resurrect() {
    let service = CoasterService::new(create_memory_store());

    for _ in 0..50 {
        let id = service
            .create(Some(JSON_CONTENT_TYPE), coaster_json("Ride", 1).as_bytes())
            .await
            .unwrap()
            .id;

        let updater = {
            let service = service.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _ = service
                    .update(&id, Some(JSON_CONTENT_TYPE), coaster_json("Ride", 2).as_bytes())
                    .await;
            })
        };
        service.delete(&id).await.unwrap();
        updater.await.unwrap();

        assert!(service.get(&id).await.is_err(), "record {id} came back");
    }
}

// ============================================================================
// Random Selection
// ============================================================================

#[tokio::test]
async fn test_random_selection_is_uniform() {
    const RECORDS: usize = 6;
    const DRAWS: usize = 6000;

    let service = CoasterService::new(create_memory_store())
        .with_selector(Arc::new(RandomSelector::with_seed(7)));
    for i in 0..RECORDS {
        service
            .create(Some(JSON_CONTENT_TYPE), coaster_json("Ride", i as i64).as_bytes())
            .await
            .unwrap();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..DRAWS {
        *counts.entry(service.random_id().await.unwrap()).or_default() += 1;
    }
    assert_eq!(counts.len(), RECORDS);

    let expected = DRAWS as f64 / RECORDS as f64;
    let statistic: f64 = counts
        .values()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let critical = ChiSquared::new((RECORDS - 1) as f64)
        .unwrap()
        .inverse_cdf(0.999);
    assert!(
        statistic < critical,
        "chi-squared {statistic:.2} exceeds {critical:.2}"
    );
}
