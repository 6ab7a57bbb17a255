//! Maintenance entity - scheduled and completed maintenance with consumed parts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;

/// Kind of maintenance performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum MaintenanceKind {
    #[default]
    Preventive,
    Corrective,
    /// A wear part was physically swapped
    Replacement,
    /// A wear part's usage counter was reset after servicing
    UsageReset,
}

impl std::fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceKind::Preventive => write!(f, "preventive"),
            MaintenanceKind::Corrective => write!(f, "corrective"),
            MaintenanceKind::Replacement => write!(f, "replacement"),
            MaintenanceKind::UsageReset => write!(f, "usage-reset"),
        }
    }
}

impl std::str::FromStr for MaintenanceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "preventive" => Ok(MaintenanceKind::Preventive),
            "corrective" => Ok(MaintenanceKind::Corrective),
            "replacement" => Ok(MaintenanceKind::Replacement),
            "usage-reset" | "reset" => Ok(MaintenanceKind::UsageReset),
            _ => Err(format!(
                "Invalid maintenance kind: {}. Use preventive, corrective, replacement, or usage-reset",
                s
            )),
        }
    }
}

/// Maintenance lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum MaintenanceStatus {
    #[default]
    Scheduled,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory consumed by a maintenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePart {
    /// Inventory item consumed
    pub item: EntityId,

    /// Item name at the time of consumption
    pub name: String,

    /// Units consumed
    pub quantity: u32,

    /// Cost per unit at the time of consumption
    #[serde(default)]
    pub unit_cost: f64,
}

impl MaintenancePart {
    pub fn cost(&self) -> f64 {
        self.quantity as f64 * self.unit_cost
    }
}

/// A maintenance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintenance {
    /// Unique identifier
    pub id: EntityId,

    /// Machine maintained
    pub machine: EntityId,

    /// Installed part involved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<EntityId>,

    pub kind: MaintenanceKind,

    /// What was (or will be) done
    pub description: String,

    #[serde(default)]
    pub status: MaintenanceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,

    /// Technician who performed the work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,

    /// Inventory consumed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MaintenancePart>,

    #[serde(default)]
    pub labor_cost: f64,

    /// Outcome notes; editable after completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for Maintenance {
    const PREFIX: EntityPrefix = EntityPrefix::Mnt;
    const COLLECTION: Collection = Collection::Maintenance;
    const KIND: &'static str = "maintenance";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.description
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

impl Maintenance {
    /// Create a scheduled maintenance
    pub fn scheduled(
        machine: EntityId,
        kind: MaintenanceKind,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mnt),
            machine,
            part: None,
            kind,
            description: description.into(),
            status: MaintenanceStatus::Scheduled,
            scheduled_for: None,
            completed: None,
            performed_by: None,
            parts: Vec::new(),
            labor_cost: 0.0,
            resolution: None,
            created: Utc::now(),
            author: author.into(),
        }
    }

    /// Create a maintenance that is already done
    pub fn completed(
        machine: EntityId,
        kind: MaintenanceKind,
        description: impl Into<String>,
        performed_by: impl Into<String>,
    ) -> Self {
        let performed_by = performed_by.into();
        let mut record = Self::scheduled(machine, kind, description, performed_by.clone());
        record.status = MaintenanceStatus::Completed;
        record.completed = Some(record.created);
        record.performed_by = Some(performed_by);
        record
    }

    pub fn is_completed(&self) -> bool {
        self.status == MaintenanceStatus::Completed
    }

    /// Sum of consumed part costs plus labor
    pub fn total_cost(&self) -> f64 {
        self.parts.iter().map(MaintenancePart::cost).sum::<f64>() + self.labor_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_cost() {
        let machine = EntityId::new(EntityPrefix::Mach);
        let mut m = Maintenance::completed(machine, MaintenanceKind::Corrective, "Seal swap", "ana");
        m.labor_cost = 40.0;
        m.parts.push(MaintenancePart {
            item: EntityId::new(EntityPrefix::Inv),
            name: "Seal".into(),
            quantity: 2,
            unit_cost: 12.5,
        });
        m.parts.push(MaintenancePart {
            item: EntityId::new(EntityPrefix::Inv),
            name: "Grease".into(),
            quantity: 1,
            unit_cost: 3.0,
        });
        assert!((m.total_cost() - 68.0).abs() < 1e-9);
    }

    #[test]
    fn test_completed_constructor() {
        let m = Maintenance::completed(
            EntityId::new(EntityPrefix::Mach),
            MaintenanceKind::UsageReset,
            "Reset",
            "ana",
        );
        assert!(m.is_completed());
        assert_eq!(m.performed_by.as_deref(), Some("ana"));
        assert!(m.completed.is_some());
        assert_eq!(m.total_cost(), 0.0);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "usage_reset".parse::<MaintenanceKind>().unwrap(),
            MaintenanceKind::UsageReset
        );
        assert_eq!(MaintenanceKind::UsageReset.to_string(), "usage-reset");
        assert!("calibration".parse::<MaintenanceKind>().is_err());
    }
}
