//! Typed access to the document store
//!
//! [`Repository`] turns raw JSON documents into entities paired with the
//! version they were read at. Writes are collected in a [`Transaction`] and
//! committed as one batch, so a version bump by another writer between read
//! and commit rejects the whole transaction with a conflict.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::core::entity::Entity;
use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::store::{Document, DocumentStore, StoreError, WriteBatch, WriteOp};

/// An entity together with the store version it was loaded at
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub entity: T,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Versioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Versioned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}

/// Typed repository over a shared document store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Load an entity, failing with `NotFound` if it does not exist
    pub fn get<T: Entity>(&self, id: &EntityId) -> Result<Versioned<T>, EngineError> {
        self.find(id)?
            .ok_or_else(|| EngineError::not_found(T::KIND, id))
    }

    /// Load an entity if it exists
    pub fn find<T: Entity>(&self, id: &EntityId) -> Result<Option<Versioned<T>>, EngineError> {
        if id.prefix() != T::PREFIX {
            return Err(EngineError::validation(format!(
                "{} is not a {} ID",
                id,
                T::KIND
            )));
        }
        let doc = self.store.get(T::COLLECTION, &id.to_string())?;
        doc.map(decode::<T>).transpose()
    }

    /// Load every entity of a type
    pub fn all<T: Entity>(&self) -> Result<Vec<Versioned<T>>, EngineError> {
        let docs = self.store.list(T::COLLECTION)?;
        tracing::debug!(collection = %T::COLLECTION, count = docs.len(), "loaded documents");
        docs.into_iter().map(decode::<T>).collect()
    }

    /// Start collecting writes
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            repo: self,
            batch: WriteBatch::new(),
        }
    }
}

fn decode<T: Entity>(doc: Document) -> Result<Versioned<T>, EngineError> {
    let entity = serde_json::from_value(doc.body).map_err(|e| {
        EngineError::from(StoreError::Corrupt {
            collection: T::COLLECTION,
            id: doc.id.clone(),
            message: e.to_string(),
        })
    })?;
    Ok(Versioned {
        version: doc.version,
        entity,
    })
}

fn encode<T: Entity>(entity: &T) -> Result<serde_json::Value, EngineError> {
    serde_json::to_value(entity).map_err(|e| EngineError::Storage(e.to_string()))
}

/// A set of pending writes, applied all-or-nothing by [`Transaction::commit`]
pub struct Transaction<'a> {
    repo: &'a Repository,
    batch: WriteBatch,
}

impl Transaction<'_> {
    /// Queue the creation of a new entity
    pub fn insert<T: Entity>(&mut self, entity: &T) -> Result<(), EngineError> {
        self.batch.push(WriteOp::Put {
            collection: T::COLLECTION,
            id: entity.id().to_string(),
            expected: None,
            body: encode(entity)?,
        });
        Ok(())
    }

    /// Queue an update of an entity loaded at `record.version`
    pub fn update<T: Entity>(&mut self, record: &Versioned<T>) -> Result<(), EngineError> {
        self.batch.push(WriteOp::Put {
            collection: T::COLLECTION,
            id: record.id().to_string(),
            expected: Some(record.version),
            body: encode(&record.entity)?,
        });
        Ok(())
    }

    /// Queue the removal of an entity loaded at `record.version`
    pub fn delete<T: Entity>(&mut self, record: &Versioned<T>) {
        self.batch.push(WriteOp::Delete {
            collection: T::COLLECTION,
            id: record.id().to_string(),
            expected: record.version,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Apply every queued write, or none of them
    pub fn commit(self) -> Result<(), EngineError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let writes = self.batch.len();
        match self.repo.store.commit(self.batch) {
            Ok(()) => {
                tracing::debug!(writes, "committed batch");
                Ok(())
            }
            Err(err) => {
                if let StoreError::Conflict { .. } = err {
                    tracing::warn!(error = %err, "batch rejected");
                }
                Err(err.into())
            }
        }
    }
}
