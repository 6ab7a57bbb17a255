//! SQLite-backed document store
//!
//! All collections share one `documents` table keyed by (collection, id).
//! Batches run inside an IMMEDIATE transaction so version checks and writes
//! happen under the same write lock.

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::{
    check_expected, lock_within, Collection, Document, DocumentStore, StoreError, WriteBatch,
    WriteOp,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    version INTEGER NOT NULL,
    body TEXT NOT NULL,
    updated TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
"#;

/// Durable document store in a single SQLite file
pub struct SqliteStore {
    conn: Mutex<Connection>,
    timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| map_err("open", timeout, e))?;
        Self::init(conn, timeout)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| map_err("open", timeout, e))?;
        Self::init(conn, timeout)
    }

    fn init(conn: Connection, timeout: Duration) -> Result<Self, StoreError> {
        conn.busy_timeout(timeout)
            .map_err(|e| map_err("open", timeout, e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| map_err("open", timeout, e))?;
        Ok(Self {
            conn: Mutex::new(conn),
            timeout,
        })
    }

    fn decode(collection: Collection, id: String, version: i64, body: &str) -> Result<Document, StoreError> {
        let body = serde_json::from_str(body).map_err(|e| StoreError::Corrupt {
            collection,
            id: id.clone(),
            message: e.to_string(),
        })?;
        Ok(Document {
            id,
            version: version as u64,
            body,
        })
    }
}

/// Busy/locked databases count as timeouts; everything else is a backend failure
fn map_err(operation: &'static str, timeout: Duration, err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            tracing::warn!(operation, "sqlite database busy");
            StoreError::Timeout { operation, timeout }
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let conn = lock_within(&self.conn, self.timeout, "get")?;
        let row = conn
            .query_row(
                "SELECT version, body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| map_err("get", self.timeout, e))?;

        row.map(|(version, body)| Self::decode(collection, id.to_string(), version, &body))
            .transpose()
    }

    fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let conn = lock_within(&self.conn, self.timeout, "list")?;
        let mut stmt = conn
            .prepare("SELECT id, version, body FROM documents WHERE collection = ?1 ORDER BY id")
            .map_err(|e| map_err("list", self.timeout, e))?;
        let rows = stmt
            .query_map(params![collection.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| map_err("list", self.timeout, e))?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, version, body) = row.map_err(|e| map_err("list", self.timeout, e))?;
            docs.push(Self::decode(collection, id, version, &body)?);
        }
        Ok(docs)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let timeout = self.timeout;
        let mut conn = lock_within(&self.conn, timeout, "commit")?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| map_err("commit", timeout, e))?;
        let now = Utc::now().to_rfc3339();

        for op in batch.ops() {
            let found: Option<u64> = tx
                .query_row(
                    "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                    params![op.collection().as_str(), op.id()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
                .map_err(|e| map_err("commit", timeout, e))?
                .map(|v| v as u64);

            // Returning early drops the transaction, which rolls it back
            check_expected(op, found)?;

            match op {
                WriteOp::Put {
                    collection,
                    id,
                    expected,
                    body,
                } => {
                    let version = expected.map_or(1, |v| v + 1) as i64;
                    let body = serde_json::to_string(body)
                        .map_err(|e| StoreError::Backend(e.to_string()))?;
                    tx.execute(
                        "INSERT INTO documents (collection, id, version, body, updated)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT (collection, id)
                         DO UPDATE SET version = excluded.version, body = excluded.body, updated = excluded.updated",
                        params![collection.as_str(), id, version, body, now],
                    )
                    .map_err(|e| map_err("commit", timeout, e))?;
                }
                WriteOp::Delete { collection, id, .. } => {
                    tx.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection.as_str(), id],
                    )
                    .map_err(|e| map_err("commit", timeout, e))?;
                }
            }
        }

        tx.commit().map_err(|e| map_err("commit", timeout, e))
    }
}
