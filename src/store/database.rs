//! DuckDB-backed store
//!
//! Caches users in an embedded DuckDB database, either on disk or in memory.
//! Each row keeps the record's position, id, and JSON payload; reads return
//! rows ordered by position.

use super::types::LocalUserStore;
use crate::error::{Error, Result};
use crate::model::UserRecord;
use async_trait::async_trait;
use duckdb::{params, Connection};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cached_users (
    position BIGINT NOT NULL,
    id VARCHAR NOT NULL,
    payload VARCHAR NOT NULL
);";

/// Store backed by an embedded DuckDB database
pub struct DuckDbUserStore {
    /// DuckDB connection; calls are blocking, so they run on the blocking pool
    conn: Arc<Mutex<Connection>>,
    /// Database file, `None` for in-memory
    path: Option<PathBuf>,
}

impl DuckDbUserStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| Error::store(format!("Failed to open DuckDB at {}: {e}", path.display())))?;
        Self::with_connection(conn, Some(path))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::store(format!("Failed to create cache table: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on tokio's blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::store(format!("DuckDB task failed: {e}")))?
    }
}

fn insert_rows(conn: &Connection, start: i64, rows: &[(String, String)]) -> Result<()> {
    let mut stmt = conn
        .prepare("INSERT INTO cached_users (position, id, payload) VALUES (?, ?, ?)")
        .map_err(|e| Error::store(format!("Failed to prepare insert: {e}")))?;

    for (offset, (id, payload)) in rows.iter().enumerate() {
        let position = start + offset as i64;
        stmt.execute(params![position, id, payload])
            .map_err(|e| Error::store(format!("Failed to insert user {id}: {e}")))?;
    }

    Ok(())
}

fn encode_rows(records: &[UserRecord]) -> Result<Vec<(String, String)>> {
    records
        .iter()
        .map(|record| {
            let payload = serde_json::to_string(record)
                .map_err(|e| Error::store(format!("Failed to encode user {}: {e}", record.id)))?;
            Ok((record.id.clone(), payload))
        })
        .collect()
}

#[async_trait]
impl LocalUserStore for DuckDbUserStore {
    async fn replace_all(&self, records: &[UserRecord]) -> Result<()> {
        let rows = encode_rows(records)?;
        self.with_conn(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| Error::store(format!("Failed to begin transaction: {e}")))?;
            tx.execute("DELETE FROM cached_users", [])
                .map_err(|e| Error::store(format!("Failed to clear cache: {e}")))?;
            insert_rows(&tx, 0, &rows)?;
            tx.commit()
                .map_err(|e| Error::store(format!("Failed to commit cache: {e}")))
        })
        .await
    }

    async fn add_all(&self, records: &[UserRecord]) -> Result<()> {
        let rows = encode_rows(records)?;
        self.with_conn(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| Error::store(format!("Failed to begin transaction: {e}")))?;
            let start: i64 = tx
                .query_row(
                    "SELECT COALESCE(MAX(position) + 1, 0) FROM cached_users",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| Error::store(format!("Failed to read cache size: {e}")))?;
            insert_rows(&tx, start, &rows)?;
            tx.commit()
                .map_err(|e| Error::store(format!("Failed to commit cache: {e}")))
        })
        .await
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        let payloads = self
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare("SELECT payload FROM cached_users ORDER BY position")
                    .map_err(|e| Error::store(format!("Failed to prepare query: {e}")))?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(|e| Error::store(format!("Failed to query cache: {e}")))?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| Error::store(format!("Failed to read cached row: {e}")))
            })
            .await?;

        payloads
            .iter()
            .map(|payload| {
                serde_json::from_str(payload)
                    .map_err(|e| Error::store(format!("Corrupt cached user: {e}")))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }
}

impl std::fmt::Debug for DuckDbUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbUserStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
