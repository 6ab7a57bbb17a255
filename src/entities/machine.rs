//! Machine and installed wear-part entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;
use crate::entities::inventory::InventoryItem;

/// Fraction of the max usage at which a part enters the warning band
pub const WARNING_RATIO: f64 = 0.75;

/// Operating status of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum MachineStatus {
    #[default]
    Operational,
    Maintenance,
    Inoperative,
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Operational => "operational",
            MachineStatus::Maintenance => "maintenance",
            MachineStatus::Inoperative => "inoperative",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MachineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "operational" => Ok(MachineStatus::Operational),
            "maintenance" => Ok(MachineStatus::Maintenance),
            "inoperative" => Ok(MachineStatus::Inoperative),
            _ => Err(format!(
                "Invalid machine status: {}. Use operational, maintenance, or inoperative",
                s
            )),
        }
    }
}

/// Wear status of an installed part
///
/// Ordered so that `Normal < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PartStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl PartStatus {
    /// Classify a usage level against its maximum
    pub fn classify(current_usage: f64, max_usage: f64) -> Self {
        if current_usage >= max_usage {
            PartStatus::Critical
        } else if current_usage >= WARNING_RATIO * max_usage {
            PartStatus::Warning
        } else {
            PartStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Normal => "normal",
            PartStatus::Warning => "warning",
            PartStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for PartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of laboratory equipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Unique identifier
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Model designation
    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Operating status
    #[serde(default)]
    pub status: MachineStatus,

    /// Inventory record the machine itself was received as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_item: Option<EntityId>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for Machine {
    const PREFIX: EntityPrefix = EntityPrefix::Mach;
    const COLLECTION: Collection = Collection::Machines;
    const KIND: &'static str = "machine";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
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

impl Machine {
    pub fn new(name: impl Into<String>, model: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mach),
            name: name.into(),
            model: model.into(),
            serial_number: None,
            location: None,
            status: MachineStatus::default(),
            inventory_item: None,
            created: Utc::now(),
            author: author.into(),
        }
    }
}

/// A wear part installed on a machine
///
/// The status is always derived from `current_usage` and `max_usage`; only
/// the alert bookkeeping (`alert_level`) is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinePart {
    /// Unique identifier of the installation slot
    pub id: EntityId,

    /// Owning machine
    pub machine: EntityId,

    /// Inventory item this part was taken from
    pub item: EntityId,

    /// Part name (copied from the inventory item)
    pub name: String,

    /// Usage unit label
    pub usage_unit: String,

    /// Cumulative usage in the current epoch
    #[serde(default)]
    pub current_usage: f64,

    /// Usage at which the part is due for replacement
    pub max_usage: f64,

    /// Highest status already alerted in the current epoch
    #[serde(default)]
    pub alert_level: PartStatus,

    /// Identity of the physical part instance, renewed on every replacement
    pub install_id: Ulid,

    /// When the current physical part was installed
    pub installed: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_replaced: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for MachinePart {
    const PREFIX: EntityPrefix = EntityPrefix::Part;
    const COLLECTION: Collection = Collection::Parts;
    const KIND: &'static str = "machine part";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &str {
        self.status().as_str()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl MachinePart {
    /// Instantiate a part from a wear-part inventory item
    ///
    /// Returns `None` if the item lacks a usage unit or lifespan.
    pub fn install(machine: &EntityId, item: &InventoryItem, author: impl Into<String>) -> Option<Self> {
        let usage_unit = item.usage_unit.clone()?;
        let max_usage = item.max_lifespan?;
        let now = Utc::now();
        Some(Self {
            id: EntityId::new(EntityPrefix::Part),
            machine: machine.clone(),
            item: item.id.clone(),
            name: item.name.clone(),
            usage_unit,
            current_usage: 0.0,
            max_usage,
            alert_level: PartStatus::Normal,
            install_id: Ulid::new(),
            installed: now,
            last_replaced: None,
            created: now,
            author: author.into(),
        })
    }

    pub fn status(&self) -> PartStatus {
        PartStatus::classify(self.current_usage, self.max_usage)
    }

    /// Usage as a percentage of the maximum; may exceed 100
    pub fn usage_percentage(&self) -> f64 {
        if self.max_usage > 0.0 {
            100.0 * self.current_usage / self.max_usage
        } else {
            0.0
        }
    }

    /// Start a new usage epoch with a fresh physical part
    pub fn reset_usage(&mut self) {
        self.current_usage = 0.0;
        self.alert_level = PartStatus::Normal;
    }

    /// Record that a new physical part went in now
    pub fn mark_replaced(&mut self) {
        let now = Utc::now();
        self.install_id = Ulid::new();
        self.installed = now;
        self.last_replaced = Some(now);
    }
}
