//! SQLite-backed coaster store
//!
//! The connection lives behind a mutex and every statement runs on tokio's
//! blocking pool, so request tasks never block the async workers on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{StoreError, StoreResult};
use super::repository::CoasterStore;
use crate::models::Coaster;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS coasters (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        manufacturer TEXT NOT NULL DEFAULT '',
        in_park TEXT NOT NULL DEFAULT '',
        height INTEGER NOT NULL DEFAULT 0
    );
"#;

const SQL_LIST: &str = "SELECT id, name, manufacturer, in_park, height FROM coasters";
const SQL_GET: &str = "SELECT id, name, manufacturer, in_park, height FROM coasters WHERE id = ?1";

/// SQLite implementation of CoasterStore
pub struct SqliteCoasterStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCoasterStore {
    /// Open (or create) a database file at `path`
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self::from_connection(conn)?;
        tracing::info!(path = %path.display(), "SQLite coaster store initialized");
        Ok(store)
    }

    /// Create in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard)
        })
        .await?
    }

    fn row_to_coaster(row: &Row<'_>) -> rusqlite::Result<Coaster> {
        Ok(Coaster {
            id: row.get(0)?,
            name: row.get(1)?,
            manufacturer: row.get(2)?,
            in_park: row.get(3)?,
            height: row.get(4)?,
        })
    }
}

#[async_trait]
impl CoasterStore for SqliteCoasterStore {
    async fn list(&self) -> StoreResult<Vec<Coaster>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SQL_LIST)?;
            let coasters = stmt
                .query_map([], Self::row_to_coaster)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(coasters)
        })
        .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Coaster>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let coaster = conn
                .query_row(SQL_GET, params![id], Self::row_to_coaster)
                .optional()?;
            Ok(coaster)
        })
        .await
    }

    async fn put(&self, id: &str, coaster: Coaster) -> StoreResult<()> {
        let coaster = coaster.with_id(id);
        self.with_conn(move |conn| {
            conn.execute(
                r#"
                    INSERT INTO coasters (id, name, manufacturer, in_park, height)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        manufacturer = excluded.manufacturer,
                        in_park = excluded.in_park,
                        height = excluded.height
                    "#,
                params![
                    coaster.id,
                    coaster.name,
                    coaster.manufacturer,
                    coaster.in_park,
                    coaster.height
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn replace(&self, id: &str, coaster: Coaster) -> StoreResult<bool> {
        let coaster = coaster.with_id(id);
        self.with_conn(move |conn| {
            let updated = conn.execute(
                "UPDATE coasters SET name = ?2, manufacturer = ?3, in_park = ?4, height = ?5
                 WHERE id = ?1",
                params![
                    coaster.id,
                    coaster.name,
                    coaster.manufacturer,
                    coaster.in_park,
                    coaster.height
                ],
            )?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM coasters WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn ids(&self) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM coasters")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM coasters", [], |row| row.get(0))?;
            usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("row count {count}")))
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
