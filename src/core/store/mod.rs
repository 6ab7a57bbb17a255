//! Document store abstraction
//!
//! Records are kept as JSON documents grouped into [`Collection`]s. Each
//! document carries a version number that starts at 1 and increases with every
//! write. Writes name the version they were based on; a [`WriteBatch`] is
//! applied all-or-nothing and is rejected with [`StoreError::Conflict`] if any
//! of its expectations no longer hold.
//!
//! Backends:
//! - [`MemoryStore`] - process-local, lost on exit
//! - [`SqliteStore`] - durable, one SQLite file per project

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default bound on any single store call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Inventory,
    Machines,
    Parts,
    UsageLogs,
    Maintenance,
    Notifications,
    Incidents,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Inventory => "inventory",
            Collection::Machines => "machines",
            Collection::Parts => "parts",
            Collection::UsageLogs => "usage_logs",
            Collection::Maintenance => "maintenance",
            Collection::Notifications => "notifications",
            Collection::Incidents => "incidents",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document with its current version
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub body: serde_json::Value,
}

/// A single write inside a batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert (`expected: None`, must not exist) or update (`expected: Some(v)`)
    Put {
        collection: Collection,
        id: String,
        expected: Option<u64>,
        body: serde_json::Value,
    },
    /// Remove a document that must currently be at `expected`
    Delete {
        collection: Collection,
        id: String,
        expected: u64,
    },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Put { collection, .. } | WriteOp::Delete { collection, .. } => *collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Put { id, .. } | WriteOp::Delete { id, .. } => id,
        }
    }

    /// The version the document must be at for this write to apply
    pub fn expected(&self) -> Option<u64> {
        match self {
            WriteOp::Put { expected, .. } => *expected,
            WriteOp::Delete { expected, .. } => Some(*expected),
        }
    }
}

/// An ordered set of writes applied atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Errors raised by store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version conflict on {collection}/{id}: expected {expected:?}, found {found:?}")]
    Conflict {
        collection: Collection,
        id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("store {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document {collection}/{id} is corrupt: {message}")]
    Corrupt {
        collection: Collection,
        id: String,
        message: String,
    },
}

/// Storage backend for labtrack documents
///
/// Implementations must apply [`DocumentStore::commit`] atomically and must
/// not block longer than their configured timeout.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Fetch every document in a collection
    fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Apply a batch of writes all-or-nothing
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Write a single document, returning its new version
    fn put(
        &self,
        collection: Collection,
        id: &str,
        expected: Option<u64>,
        body: serde_json::Value,
    ) -> Result<u64, StoreError> {
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Put {
            collection,
            id: id.to_string(),
            expected,
            body,
        });
        self.commit(batch)?;
        Ok(expected.map_or(1, |v| v + 1))
    }

    /// Remove a single document at the given version
    fn delete(&self, collection: Collection, id: &str, expected: u64) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Delete {
            collection,
            id: id.to_string(),
            expected,
        });
        self.commit(batch)
    }
}

/// Check a write's version expectation against the current version
pub(crate) fn check_expected(op: &WriteOp, found: Option<u64>) -> Result<(), StoreError> {
    let expected = op.expected();
    if expected != found {
        return Err(StoreError::Conflict {
            collection: op.collection(),
            id: op.id().to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Acquire a backend mutex, giving up after `timeout`
pub(crate) fn lock_within<'a, T>(
    mutex: &'a Mutex<T>,
    timeout: Duration,
    operation: &'static str,
) -> Result<MutexGuard<'a, T>, StoreError> {
    let start = Instant::now();
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::WouldBlock) => {
                if start.elapsed() >= timeout {
                    tracing::warn!(operation, ?timeout, "store lock not acquired in time");
                    return Err(StoreError::Timeout { operation, timeout });
                }
                std::thread::sleep(LOCK_POLL_INTERVAL);
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(StoreError::Backend("store lock poisoned".to_string()));
            }
        }
    }
}
