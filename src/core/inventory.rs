//! Inventory service - stock levels for consumables, wear parts and spares

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::alerts::stock_alert;
use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::repo::{Repository, Transaction, Versioned};
use crate::entities::inventory::InventoryItem;
use crate::entities::machine::MachinePart;
use crate::entities::notification::Notification;

/// Inventory collaborator
#[derive(Clone)]
pub struct Inventory {
    repo: Repository,
}

impl Inventory {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Validate and store a new item
    ///
    /// Name and usage unit are stored trimmed.
    pub fn create(&self, mut item: InventoryItem) -> Result<InventoryItem, EngineError> {
        item.normalize();
        item.validate().map_err(EngineError::Validation)?;
        let mut tx = self.repo.begin();
        tx.insert(&item)?;
        tx.commit()?;
        info!(id = %item.id, name = %item.name, kind = %item.kind, "inventory item created");
        Ok(item)
    }

    pub fn get_inventory_item_by_id(&self, id: &EntityId) -> Result<InventoryItem, EngineError> {
        Ok(self.repo.get::<InventoryItem>(id)?.into_inner())
    }

    /// All items sorted by name; archived items only when asked for
    pub fn list(&self, include_archived: bool) -> Result<Vec<InventoryItem>, EngineError> {
        let mut items: Vec<InventoryItem> = self
            .repo
            .all::<InventoryItem>()?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|i| include_archived || !i.archived)
            .collect();
        items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(items)
    }

    /// Active items of kind wear-part
    pub fn get_wear_parts(&self) -> Result<Vec<InventoryItem>, EngineError> {
        Ok(self
            .list(false)?
            .into_iter()
            .filter(InventoryItem::is_wear_part)
            .collect())
    }

    /// Change the quantity on hand by `delta`
    ///
    /// Fails without mutation if the result would be negative. Moving into low
    /// or out-of-stock emits a notification in the same commit.
    pub fn adjust_quantity(&self, id: &EntityId, delta: i64) -> Result<InventoryItem, EngineError> {
        let mut record = self.repo.get::<InventoryItem>(id)?;
        let new_quantity = i64::from(record.quantity) + delta;
        if new_quantity < 0 {
            return Err(EngineError::InsufficientStock {
                item: record.name.clone(),
                available: record.quantity,
                requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
            });
        }
        let new_quantity = u32::try_from(new_quantity)
            .map_err(|_| EngineError::validation(format!("quantity {} is too large", new_quantity)))?;

        let before = record.stock_status();
        record.quantity = new_quantity;

        let mut tx = self.repo.begin();
        tx.update(&record)?;
        if let Some(alert) = stock_alert(&record, before) {
            tx.insert(&alert)?;
        }
        tx.commit()?;
        info!(id = %id, delta, quantity = new_quantity, "inventory adjusted");
        Ok(record.into_inner())
    }

    /// Soft-delete an item
    pub fn archive(&self, id: &EntityId) -> Result<InventoryItem, EngineError> {
        let mut record = self.repo.get::<InventoryItem>(id)?;
        if !record.archived {
            record.archived = true;
            let mut tx = self.repo.begin();
            tx.update(&record)?;
            tx.commit()?;
        }
        Ok(record.into_inner())
    }

    /// Hard-delete an item that no installed part references
    ///
    /// Installs rewrite the item they draw from, so an install racing this
    /// delete bumps the version read here and the delete conflicts.
    pub fn delete(&self, id: &EntityId) -> Result<InventoryItem, EngineError> {
        let record = self.repo.get::<InventoryItem>(id)?;
        let in_use = self
            .repo
            .all::<MachinePart>()?
            .iter()
            .filter(|p| &p.item == id)
            .count();
        if in_use > 0 {
            return Err(EngineError::validation(format!(
                "'{}' is installed on {} machine part(s); archive it instead",
                record.name, in_use
            )));
        }
        let mut tx = self.repo.begin();
        tx.delete(&record);
        tx.commit()?;
        info!(id = %id, "inventory item deleted");
        Ok(record.into_inner())
    }
}

/// Inventory drawn down inside a larger transaction
///
/// Quantities are summed per item first, so listing the same item twice is
/// one stock movement, not two competing writes.
#[derive(Debug, Default)]
pub(crate) struct Consumption {
    quantities: BTreeMap<EntityId, u32>,
}

impl Consumption {
    pub fn add(&mut self, item: &EntityId, quantity: u32) {
        *self.quantities.entry(item.clone()).or_insert(0) += quantity;
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Check stock for every item and queue the decrements
    ///
    /// Returns the consumed items (after decrement) with their quantities,
    /// and any stock alerts that were queued.
    pub fn stage(
        self,
        repo: &Repository,
        tx: &mut Transaction<'_>,
    ) -> Result<(Vec<(InventoryItem, u32)>, Vec<Notification>), EngineError> {
        let mut consumed = Vec::new();
        let mut alerts = Vec::new();
        for (id, quantity) in self.quantities {
            let mut record = repo.get::<InventoryItem>(&id)?;
            if record.quantity < quantity {
                return Err(EngineError::InsufficientStock {
                    item: record.name.clone(),
                    available: record.quantity,
                    requested: quantity,
                });
            }
            let before = record.stock_status();
            record.quantity -= quantity;
            tx.update(&record)?;
            if let Some(alert) = stock_alert(&record, before) {
                tx.insert(&alert)?;
                alerts.push(alert);
            }
            debug!(item = %id, quantity, remaining = record.quantity, "stock consumed");
            consumed.push((record.into_inner(), quantity));
        }
        Ok((consumed, alerts))
    }
}
