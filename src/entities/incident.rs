//! Incident entity - problems reported against a machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;
use crate::entities::notification::Severity;

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum IncidentStatus {
    #[default]
    Open,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incident report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: EntityId,

    /// Machine involved
    pub machine: EntityId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub severity: Severity,

    #[serde(default)]
    pub status: IncidentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Person who reported the incident
    pub author: String,
}

impl Entity for Incident {
    const PREFIX: EntityPrefix = EntityPrefix::Inc;
    const COLLECTION: Collection = Collection::Incidents;
    const KIND: &'static str = "incident";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        self.status.as_str()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Incident {
    pub fn new(
        machine: EntityId,
        title: impl Into<String>,
        severity: Severity,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Inc),
            machine,
            title: title.into(),
            description: None,
            severity,
            status: IncidentStatus::Open,
            resolution: None,
            resolved: None,
            created: Utc::now(),
            author: author.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == IncidentStatus::Open
    }
}
