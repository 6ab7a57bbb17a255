//! Entity trait - common interface for all stored record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;

/// Common trait for all labtrack entities
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// The entity type prefix (e.g., `PART`, `INV`)
    const PREFIX: EntityPrefix;

    /// Document collection the entity is stored in
    const COLLECTION: Collection;

    /// Singular name used in messages (e.g., "machine part")
    const KIND: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the entity's display title
    fn title(&self) -> &str;

    /// Get the entity's status as a display string
    fn status(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}
