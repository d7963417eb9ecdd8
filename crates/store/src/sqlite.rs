//! SQLite-backed record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;

use flyid_core::{
    traits::RecordStore,
    types::{CatchRecord, NewCatchRecord, RecordId},
    Error, Result,
};

/// SQLite record store. The analysis document is kept as JSON alongside the
/// indexed owner and timestamp columns.
pub struct SqliteRecordStore {
    conn: Arc<tokio::sync::Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) a store at the given path.
    pub fn new(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("DB error: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("DB error: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS catch_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at INTEGER NOT NULL, -- unix micros
                document TEXT NOT NULL       -- JSON NewCatchRecord
            )",
            [],
        )
        .map_err(|e| Error::storage(format!("Schema error: {}", e)))?;

        // History queries filter by owner and sort by time
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_catch_records_user_created
             ON catch_records (user_id, created_at DESC)",
            [],
        )
        .map_err(|e| Error::storage(format!("Index error: {}", e)))?;

        Ok(Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        })
    }

    fn row_to_record(id: String, created_at: i64, document: String) -> Result<CatchRecord> {
        let record: NewCatchRecord = serde_json::from_str(&document)
            .map_err(|e| Error::storage(format!("Corrupt record {}: {}", id, e)))?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(created_at)
            .ok_or_else(|| Error::storage(format!("Invalid timestamp on record {}", id)))?;
        Ok(record.into_record(RecordId(id), created_at))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewCatchRecord) -> Result<RecordId> {
        let conn = self.conn.clone();
        let id = RecordId::generate();
        let user_id = record.user_id.clone();
        let document = serde_json::to_string(&record)?;
        let created_at = Utc::now().timestamp_micros();

        let row_id = id.0.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO catch_records (id, user_id, created_at, document)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row_id, user_id, created_at, document],
            )
            .map_err(|e| Error::storage(format!("Insert error: {}", e)))?;
            Ok::<_, Error>(())
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))??;

        tracing::debug!(record_id = %id, "Record stored in SQLite");
        Ok(id)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<CatchRecord>> {
        let conn = self.conn.clone();
        let target_id = id.0.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let row = conn
                .query_row(
                    "SELECT id, created_at, document FROM catch_records WHERE id = ?1",
                    params![target_id],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?)),
                )
                .optional()
                .map_err(|e| Error::storage(format!("Query error: {}", e)))?;

            row.map(|(id, created_at, document)| Self::row_to_record(id, created_at, document))
                .transpose()
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<CatchRecord>> {
        let conn = self.conn.clone();
        let uid = user_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, created_at, document FROM catch_records
                     WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| Error::storage(format!("Prepare error: {}", e)))?;

            let rows = stmt
                .query_map(params![uid, limit], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
                })
                .map_err(|e| Error::storage(format!("Query error: {}", e)))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::storage(format!("Result error: {}", e)))?;

            rows.into_iter()
                .map(|(id, created_at, document)| Self::row_to_record(id, created_at, document))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM catch_records", [], |row| row.get(0))
                .map_err(|e| Error::storage(format!("Count error: {}", e)))?;
            Ok(count as usize)
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }
}
