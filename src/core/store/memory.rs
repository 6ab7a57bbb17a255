//! In-memory document store
//!
//! Contents live only as long as the process. Used for tests and for the
//! `memory` backend setting.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    check_expected, lock_within, Collection, Document, DocumentStore, StoreError, WriteBatch,
    WriteOp, DEFAULT_TIMEOUT,
};

#[derive(Debug, Clone)]
struct Stored {
    version: u64,
    body: serde_json::Value,
}

type Tables = HashMap<Collection, BTreeMap<String, Stored>>;

/// Process-local document store
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    timeout: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            timeout,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let tables = lock_within(&self.tables, self.timeout, "get")?;
        Ok(tables
            .get(&collection)
            .and_then(|t| t.get(id))
            .map(|s| Document {
                id: id.to_string(),
                version: s.version,
                body: s.body.clone(),
            }))
    }

    fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let tables = lock_within(&self.tables, self.timeout, "list")?;
        Ok(tables
            .get(&collection)
            .map(|t| {
                t.iter()
                    .map(|(id, s)| Document {
                        id: id.clone(),
                        version: s.version,
                        body: s.body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tables = lock_within(&self.tables, self.timeout, "commit")?;

        // Validate the whole batch against a staged view before touching anything
        let mut staged: HashMap<(Collection, String), Option<u64>> = HashMap::new();
        for op in batch.ops() {
            let key = (op.collection(), op.id().to_string());
            let found = match staged.get(&key) {
                Some(v) => *v,
                None => tables
                    .get(&op.collection())
                    .and_then(|t| t.get(op.id()))
                    .map(|s| s.version),
            };
            check_expected(op, found)?;
            let next = match op {
                WriteOp::Put { expected, .. } => Some(expected.map_or(1, |v| v + 1)),
                WriteOp::Delete { .. } => None,
            };
            staged.insert(key, next);
        }

        for op in batch.into_ops() {
            match op {
                WriteOp::Put {
                    collection,
                    id,
                    expected,
                    body,
                } => {
                    tables.entry(collection).or_default().insert(
                        id,
                        Stored {
                            version: expected.map_or(1, |v| v + 1),
                            body,
                        },
                    );
                }
                WriteOp::Delete { collection, id, .. } => {
                    if let Some(table) = tables.get_mut(&collection) {
                        table.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_put_get_versions() {
        let store = MemoryStore::new();
        let v1 = store
            .put(Collection::Inventory, "INV-1", None, json!({"q": 1}))
            .unwrap();
        assert_eq!(v1, 1);

        let v2 = store
            .put(Collection::Inventory, "INV-1", Some(1), json!({"q": 2}))
            .unwrap();
        assert_eq!(v2, 2);

        let doc = store.get(Collection::Inventory, "INV-1").unwrap().unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.body["q"], 2);
    }

    #[test]
    fn test_stale_write_conflicts() {
        let store = MemoryStore::new();
        store
            .put(Collection::Parts, "PART-1", None, json!({"u": 0}))
            .unwrap();
        store
            .put(Collection::Parts, "PART-1", Some(1), json!({"u": 5}))
            .unwrap();

        let err = store
            .put(Collection::Parts, "PART-1", Some(1), json!({"u": 9}))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let doc = store.get(Collection::Parts, "PART-1").unwrap().unwrap();
        assert_eq!(doc.body["u"], 5);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store
            .put(Collection::Inventory, "INV-1", None, json!({"q": 3}))
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Put {
            collection: Collection::Inventory,
            id: "INV-1".into(),
            expected: Some(1),
            body: json!({"q": 2}),
        });
        // Stale expectation on a second document fails the batch
        batch.push(WriteOp::Put {
            collection: Collection::Parts,
            id: "PART-9".into(),
            expected: Some(4),
            body: json!({}),
        });
        assert!(store.commit(batch).is_err());

        let doc = store.get(Collection::Inventory, "INV-1").unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.body["q"], 3);
        assert!(store.get(Collection::Parts, "PART-9").unwrap().is_none());
    }

    #[test]
    fn test_delete_and_list() {
        let store = MemoryStore::new();
        store.put(Collection::Notifications, "a", None, json!({})).unwrap();
        store.put(Collection::Notifications, "b", None, json!({})).unwrap();
        assert_eq!(store.list(Collection::Notifications).unwrap().len(), 2);

        store.delete(Collection::Notifications, "a", 1).unwrap();
        let remaining = store.list(Collection::Notifications).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");

        assert!(store.list(Collection::Incidents).unwrap().is_empty());
    }

    #[test]
    fn test_same_document_twice_in_batch() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Put {
            collection: Collection::Parts,
            id: "p".into(),
            expected: None,
            body: json!({"n": 1}),
        });
        batch.push(WriteOp::Put {
            collection: Collection::Parts,
            id: "p".into(),
            expected: Some(1),
            body: json!({"n": 2}),
        });
        store.commit(batch).unwrap();
        let doc = store.get(Collection::Parts, "p").unwrap().unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.body["n"], 2);
    }

    #[test]
    fn test_blocked_store_times_out() {
        let store = Arc::new(MemoryStore::with_timeout(Duration::from_millis(20)));
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let _guard = store.tables.lock().unwrap();
                locked_tx.send(()).unwrap();
                let _ = release_rx.recv();
            })
        };

        locked_rx.recv().unwrap();
        let err = store.get(Collection::Parts, "x").unwrap_err();
        assert!(matches!(err, StoreError::Timeout { operation: "get", .. }));

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(store.get(Collection::Parts, "x").unwrap().is_none());
    }
}
