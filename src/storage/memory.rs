//! In-process coaster store
//!
//! A `HashMap` behind a tokio `RwLock`: list/get share the lock, writes take
//! it exclusively for the duration of a single map operation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StoreResult;
use super::repository::CoasterStore;
use crate::models::Coaster;

/// In-memory storage for coaster records
pub struct MemoryCoasterStore {
    /// Map of id -> Coaster
    coasters: RwLock<HashMap<String, Coaster>>,
}

impl MemoryCoasterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            coasters: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with `coasters`, keyed by their ids
    pub fn with_records(coasters: impl IntoIterator<Item = Coaster>) -> Self {
        let map = coasters.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            coasters: RwLock::new(map),
        }
    }

    /// Get the number of records
    pub async fn len(&self) -> usize {
        self.coasters.read().await.len()
    }

    /// Check if empty
    pub async fn is_empty(&self) -> bool {
        self.coasters.read().await.is_empty()
    }

    /// Remove every record
    pub async fn clear(&self) {
        self.coasters.write().await.clear();
    }
}

impl Default for MemoryCoasterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoasterStore for MemoryCoasterStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        let coasters = self.coasters.read().await;
        Ok(coasters.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Coaster>> {
        let coasters = self.coasters.read().await;
        Ok(coasters.get(id).cloned())
    }

    async fn put(&self, id: &str, coaster: Coaster) -> StoreResult<()> {
        let coaster = coaster.with_id(id);
        let mut coasters = self.coasters.write().await;
        coasters.insert(id.to_string(), coaster);
        Ok(())
    }

    async fn replace(&self, id: &str, coaster: Coaster) -> StoreResult<bool> {
        let coaster = coaster.with_id(id);
        let mut coasters = self.coasters.write().await;
        match coasters.get_mut(id) {
            Some(existing) => {
                *existing = coaster;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut coasters = self.coasters.write().await;
        Ok(coasters.remove(id).is_some())
    }

    async fn ids(&self) -> StoreResult<Vec<String>> {
        let coasters = self.coasters.read().await;
        Ok(coasters.keys().cloned().collect())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len().await)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
