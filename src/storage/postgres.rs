//! PostgreSQL-backed coaster store
//!
//! Each operation is a single statement on a pooled connection, so the
//! database's own statement atomicity provides the store's guarantees.

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};

use super::error::{StoreError, StoreResult};
use super::repository::CoasterStore;
use crate::models::Coaster;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS coasters (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        manufacturer TEXT NOT NULL DEFAULT '',
        in_park TEXT NOT NULL DEFAULT '',
        height BIGINT NOT NULL DEFAULT 0
    );
"#;

/// PostgreSQL implementation of CoasterStore
pub struct PostgresCoasterStore {
    pool: Pool,
}

impl PostgresCoasterStore {
    /// Build a connection pool for `url` and make sure the table exists
    pub async fn connect(url: &str, pool_size: usize) -> StoreResult<Self> {
        let mut cfg = Config::new();
        cfg.url = Some(url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(pool_size));

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

        let store = Self { pool };
        store.create_schema().await?;

        tracing::info!(pool_size, "PostgreSQL coaster store initialized");
        Ok(store)
    }

    async fn create_schema(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    fn row_to_coaster(row: &Row) -> Result<Coaster, tokio_postgres::Error> {
        Ok(Coaster {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
            manufacturer: row.try_get(2)?,
            in_park: row.try_get(3)?,
            height: row.try_get(4)?,
        })
    }
}

#[async_trait]
impl CoasterStore for PostgresCoasterStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT id, name, manufacturer, in_park, height FROM coasters", &[])
            .await?;

        rows.iter()
            .map(|row| Self::row_to_coaster(row).map_err(StoreError::from))
            .collect()
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Coaster>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, manufacturer, in_park, height FROM coasters WHERE id = $1",
                &[&id],
            )
            .await?;

        row.as_ref()
            .map(Self::row_to_coaster)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, id: &str, coaster: Coaster) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                    INSERT INTO coasters (id, name, manufacturer, in_park, height)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (id) DO UPDATE SET
                        name = EXCLUDED.name,
                        manufacturer = EXCLUDED.manufacturer,
                        in_park = EXCLUDED.in_park,
                        height = EXCLUDED.height
                    "#,
                &[
                    &id,
                    &coaster.name,
                    &coaster.manufacturer,
                    &coaster.in_park,
                    &coaster.height,
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, id: &str, coaster: Coaster) -> StoreResult<bool> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE coasters SET name = $2, manufacturer = $3, in_park = $4, height = $5
                 WHERE id = $1",
                &[
                    &id,
                    &coaster.name,
                    &coaster.manufacturer,
                    &coaster.in_park,
                    &coaster.height,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM coasters WHERE id = $1", &[&id])
            .await?;
        Ok(removed > 0)
    }

    async fn ids(&self) -> StoreResult<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client.query("SELECT id FROM coasters", &[]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(StoreError::from))
            .collect()
    }

    async fn count(&self) -> StoreResult<usize> {
        let client = self.pool.get().await?;
        let row = client.query_one("SELECT COUNT(*) FROM coasters", &[]).await?;
        let count: i64 = row.try_get(0)?;
        usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("row count {count}")))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
