//! Notification entity - alerts raised by usage thresholds and stock levels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;

/// What raised the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    UsageWarning,
    UsageCritical,
    LowStock,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::UsageWarning => write!(f, "usage-warning"),
            NotificationKind::UsageCritical => write!(f, "usage-critical"),
            NotificationKind::LowStock => write!(f, "low-stock"),
        }
    }
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Invalid severity: {}. Use low, medium, or high", s)),
        }
    }
}

/// A user-facing notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: EntityId,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub title: String,

    pub message: String,

    pub severity: Severity,

    #[serde(default)]
    pub read: bool,

    /// Entity the notification is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<EntityId>,

    /// Creation timestamp
    pub created: DateTime<Utc>,
}

impl Entity for Notification {
    const PREFIX: EntityPrefix = EntityPrefix::Ntf;
    const COLLECTION: Collection = Collection::Notifications;
    const KIND: &'static str = "notification";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        if self.read {
            "read"
        } else {
            "unread"
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        "labtrack"
    }
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        related: Option<EntityId>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ntf),
            kind,
            title: title.into(),
            message: message.into(),
            severity,
            read: false,
            related,
            created: Utc::now(),
        }
    }
}
