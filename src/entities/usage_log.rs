//! Usage log entity - append-only audit trail of recorded part usage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;

/// One recorded usage event
///
/// Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLog {
    /// Unique identifier
    pub id: EntityId,

    /// Machine the usage happened on
    pub machine: EntityId,

    /// Inventory item of the part that was used
    pub item: EntityId,

    /// Installed part the usage was booked against
    pub part: EntityId,

    /// When the usage was recorded
    pub date: DateTime<Utc>,

    /// Amount used
    pub amount: f64,

    /// Unit of `amount`
    pub unit: String,

    /// Person responsible for the usage
    pub responsible: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for UsageLog {
    const PREFIX: EntityPrefix = EntityPrefix::Use;
    const COLLECTION: Collection = Collection::UsageLogs;
    const KIND: &'static str = "usage log";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        self.notes.as_deref().unwrap_or(&self.unit)
    }

    fn status(&self) -> &str {
        "recorded"
    }

    fn created(&self) -> DateTime<Utc> {
        self.date
    }

    fn author(&self) -> &str {
        &self.responsible
    }
}
