//! Inventory item entity - stock of consumables, wear parts and spares

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Collection;

/// Kind of inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[derive(Default)]
pub enum ItemKind {
    Consumable,
    /// Part with a finite lifespan, tracked by cumulative usage
    WearPart,
    #[default]
    GeneralSpare,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Consumable => write!(f, "consumable"),
            ItemKind::WearPart => write!(f, "wear-part"),
            ItemKind::GeneralSpare => write!(f, "general-spare"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "consumable" => Ok(ItemKind::Consumable),
            "wear-part" | "wear" => Ok(ItemKind::WearPart),
            "general-spare" | "spare" => Ok(ItemKind::GeneralSpare),
            _ => Err(format!(
                "Invalid item kind: {}. Use consumable, wear-part, or general-spare",
                s
            )),
        }
    }
}

/// Stock level derived from quantity and minimum quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(quantity: u32, min_quantity: u32) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= min_quantity {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in-stock",
            StockStatus::LowStock => "low-stock",
            StockStatus::OutOfStock => "out-of-stock",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique identifier
    pub id: EntityId,

    /// Item name
    pub name: String,

    /// Free-form category (e.g., "seals", "filters")
    #[serde(default)]
    pub category: String,

    /// Item kind
    #[serde(default)]
    pub kind: ItemKind,

    /// Units on hand
    #[serde(default)]
    pub quantity: u32,

    /// Reorder point: at or below this the item is low on stock
    #[serde(default)]
    pub min_quantity: u32,

    /// Usage unit label (e.g., "hours", "cycles"); wear parts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_unit: Option<String>,

    /// Maximum lifespan in `usage_unit`; wear parts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lifespan: Option<f64>,

    /// Cost per unit, used for maintenance costing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,

    /// Storage location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Soft-deleted items are hidden from listings but keep their history
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archived: bool,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for InventoryItem {
    const PREFIX: EntityPrefix = EntityPrefix::Inv;
    const COLLECTION: Collection = Collection::Inventory;
    const KIND: &'static str = "inventory item";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &str {
        self.stock_status().as_str()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl InventoryItem {
    /// Create a new item of the given kind with no stock
    pub fn new(name: impl Into<String>, kind: ItemKind, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Inv),
            name: name.into(),
            category: String::new(),
            kind,
            quantity: 0,
            min_quantity: 0,
            usage_unit: None,
            max_lifespan: None,
            unit_cost: None,
            location: None,
            description: None,
            archived: false,
            created: Utc::now(),
            author: author.into(),
        }
    }

    /// Create a wear part with its usage unit and lifespan
    pub fn wear_part(
        name: impl Into<String>,
        usage_unit: impl Into<String>,
        max_lifespan: f64,
        author: impl Into<String>,
    ) -> Self {
        let mut item = Self::new(name, ItemKind::WearPart, author);
        item.usage_unit = Some(usage_unit.into());
        item.max_lifespan = Some(max_lifespan);
        item
    }

    pub fn is_wear_part(&self) -> bool {
        self.kind == ItemKind::WearPart
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.min_quantity)
    }

    /// Trim free-text fields that are compared by value
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        if let Some(unit) = self.usage_unit.as_mut() {
            *unit = unit.trim().to_string();
        }
    }

    /// Check the kind-dependent field rules
    ///
    /// Wear parts need a usage unit and a positive lifespan; other kinds must
    /// not carry either.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("item name must not be empty".to_string());
        }
        if let Some(cost) = self.unit_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(format!("unit cost must be a non-negative number, got {}", cost));
            }
        }
        match self.kind {
            ItemKind::WearPart => {
                match self.usage_unit.as_deref().map(str::trim) {
                    Some(unit) if !unit.is_empty() => {}
                    _ => return Err("wear parts require a usage unit".to_string()),
                }
                match self.max_lifespan {
                    Some(max) if max.is_finite() && max > 0.0 => {}
                    Some(max) => {
                        return Err(format!("max lifespan must be positive, got {}", max))
                    }
                    None => return Err("wear parts require a max lifespan".to_string()),
                }
            }
            ItemKind::Consumable | ItemKind::GeneralSpare => {
                if self.usage_unit.is_some() || self.max_lifespan.is_some() {
                    return Err(format!(
                        "usage unit and max lifespan only apply to wear parts, not {}",
                        self.kind
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = InventoryItem::new("Nitrile gloves", ItemKind::Consumable, "test");
        assert!(item.id.to_string().starts_with("INV-"));
        assert_eq!(item.quantity, 0);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(StockStatus::classify(0, 2), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(2, 2), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(3, 2), StockStatus::InStock);
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
    }

    #[test]
    fn test_wear_part_requires_unit_and_lifespan() {
        let ok = InventoryItem::wear_part("Rotor seal", "hours", 500.0, "test");
        assert!(ok.validate().is_ok());

        let mut no_unit = ok.clone();
        no_unit.usage_unit = Some("  ".into());
        assert!(no_unit.validate().is_err());

        let mut no_life = ok.clone();
        no_life.max_lifespan = None;
        assert!(no_life.validate().is_err());

        let mut zero_life = ok;
        zero_life.max_lifespan = Some(0.0);
        assert!(zero_life.validate().is_err());
    }

    #[test]
    fn test_lifespan_only_for_wear_parts() {
        let mut spare = InventoryItem::new("Fuse", ItemKind::GeneralSpare, "test");
        spare.max_lifespan = Some(10.0);
        assert!(spare.validate().is_err());
    }

    #[test]
    fn test_item_kind_parse() {
        assert_eq!("wear-part".parse::<ItemKind>().unwrap(), ItemKind::WearPart);
        assert_eq!("wear_part".parse::<ItemKind>().unwrap(), ItemKind::WearPart);
        assert_eq!("Consumable".parse::<ItemKind>().unwrap(), ItemKind::Consumable);
        assert!("gizmo".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_item_roundtrip() {
        let mut item = InventoryItem::wear_part("Pump membrane", "cycles", 10_000.0, "test");
        item.quantity = 4;
        item.min_quantity = 1;

        let yaml = serde_yml::to_string(&item).unwrap();
        assert!(yaml.contains("kind: wear-part"));
        let parsed: InventoryItem = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, item.id);
        assert_eq!(parsed.max_lifespan, Some(10_000.0));
        assert_eq!(parsed.stock_status(), StockStatus::InStock);
    }
}
