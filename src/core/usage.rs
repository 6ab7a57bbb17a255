//! Usage accounting engine
//!
//! Tracks cumulative usage of installed wear parts against their maximum
//! lifespan and decides when a threshold crossing needs an alert.
//!
//! Each part moves through the following states within a usage epoch:
//!
//! ```text
//! Normal --(>= 75% of max)--> Warning --(>= 100% of max)--> Critical
//! any --(replace_part / register_maintenance_reset)--> Normal, usage 0
//! ```
//!
//! The status is always recomputed from `current_usage` and `max_usage`.
//! Alerts are edge-triggered: a part's `alert_level` remembers the highest
//! status already alerted in the epoch, so staying in a band never alerts
//! twice. Every operation commits its writes as one batch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::core::alerts::usage_alert;
use crate::core::error::EngineError;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::inventory::Consumption;
use crate::core::machines::Machines;
use crate::core::repo::Repository;
use crate::entities::inventory::InventoryItem;
use crate::entities::machine::{Machine, MachinePart, PartStatus};
use crate::entities::maintenance::{Maintenance, MaintenanceKind, MaintenancePart};
use crate::entities::notification::Notification;
use crate::entities::usage_log::UsageLog;

/// Result of a successful [`UsageEngine::record_usage`]
#[derive(Debug, Clone)]
pub struct UsageReceipt {
    pub part: MachinePart,
    pub log: UsageLog,
    /// `100 × current_usage / max_usage`, unbounded above
    pub percentage: f64,
    pub status: PartStatus,
    /// Alert emitted by this call, if it crossed a threshold
    pub alert: Option<Notification>,
}

/// Usage snapshot for one installed part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub machine: EntityId,
    pub machine_name: String,
    pub part: EntityId,
    pub part_name: String,
    pub item: EntityId,
    pub unit: String,
    pub accumulated: f64,
    pub max_usage: f64,
    pub percentage: f64,
    pub status: PartStatus,
    pub requires_maintenance: bool,
    pub alert: bool,
}

/// Inventory consumed during maintenance, beyond the part itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedPart {
    pub item: EntityId,
    pub quantity: u32,
}

/// Details of a maintenance that resets a part's usage
#[derive(Debug, Clone, Default)]
pub struct MaintenanceDetails {
    /// Technician responsible
    pub performed_by: String,
    pub description: Option<String>,
    /// Whether the physical part was swapped for a new unit from stock
    pub replaced: bool,
    pub consumed: Vec<ConsumedPart>,
    pub labor_cost: f64,
    pub resolution: Option<String>,
}

/// Usage accounting engine
#[derive(Clone)]
pub struct UsageEngine {
    repo: Repository,
    machines: Machines,
}

impl UsageEngine {
    pub fn new(repo: Repository) -> Self {
        let machines = Machines::new(repo.clone());
        Self { repo, machines }
    }

    /// Book usage against the part of `item_id` installed on `machine_id`
    pub fn record_usage(
        &self,
        machine_id: &EntityId,
        item_id: &EntityId,
        amount: f64,
        unit: &str,
        responsible: &str,
        notes: Option<&str>,
    ) -> Result<UsageReceipt, EngineError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::validation(format!(
                "usage amount must be a positive number, got {}",
                amount
            )));
        }
        if responsible.trim().is_empty() {
            return Err(EngineError::validation("a responsible person is required"));
        }

        let machine = self.repo.get::<Machine>(machine_id)?;
        let mut part = self.machines.find_part(machine_id, item_id)?;

        let unit = unit.trim();
        if unit != part.usage_unit.trim() {
            return Err(EngineError::validation(format!(
                "{} is tracked in '{}', not '{}'",
                part.name, part.usage_unit, unit
            )));
        }

        part.current_usage += amount;
        let status = part.status();
        let alert = if status > part.alert_level {
            part.alert_level = status;
            usage_alert(&part, &machine.name, status)
        } else {
            None
        };

        let log = UsageLog {
            id: EntityId::new(EntityPrefix::Use),
            machine: machine_id.clone(),
            item: item_id.clone(),
            part: part.id.clone(),
            date: chrono::Utc::now(),
            amount,
            unit: unit.to_string(),
            responsible: responsible.trim().to_string(),
            notes: notes.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
        };

        let mut tx = self.repo.begin();
        tx.update(&part)?;
        tx.insert(&log)?;
        if let Some(alert) = &alert {
            tx.insert(alert)?;
        }
        tx.commit()?;

        let percentage = part.usage_percentage();
        info!(
            part = %part.id,
            amount,
            usage = part.current_usage,
            percentage,
            status = %status,
            "usage recorded"
        );
        if let Some(alert) = &alert {
            warn!(part = %part.id, severity = %alert.severity, "{}", alert.title);
        }

        Ok(UsageReceipt {
            part: part.into_inner(),
            log,
            percentage,
            status,
            alert,
        })
    }

    /// Usage snapshot of every installed part
    ///
    /// Derived entirely from stored part and machine state; order is not
    /// meaningful.
    pub fn aggregate_usage_info(&self) -> Result<Vec<UsageInfo>, EngineError> {
        let names: HashMap<EntityId, String> = self
            .repo
            .all::<Machine>()?
            .into_iter()
            .map(|m| {
                let m = m.into_inner();
                (m.id, m.name)
            })
            .collect();

        Ok(self
            .repo
            .all::<MachinePart>()?
            .into_iter()
            .map(|p| {
                let p = p.into_inner();
                let percentage = p.usage_percentage();
                UsageInfo {
                    machine_name: names.get(&p.machine).cloned().unwrap_or_default(),
                    machine: p.machine,
                    part: p.id,
                    part_name: p.name,
                    item: p.item,
                    unit: p.usage_unit,
                    accumulated: p.current_usage,
                    max_usage: p.max_usage,
                    percentage,
                    status: PartStatus::classify(p.current_usage, p.max_usage),
                    requires_maintenance: percentage >= 100.0,
                    alert: percentage >= 75.0,
                }
            })
            .collect())
    }

    /// Reset a part's usage after maintenance
    ///
    /// Starts a new usage epoch and records a completed maintenance. With
    /// `details.replaced` one unit of the part's item is taken from stock and
    /// the part gets a new installation identity.
    pub fn register_maintenance_reset(
        &self,
        machine_id: &EntityId,
        item_id: &EntityId,
        details: MaintenanceDetails,
    ) -> Result<Maintenance, EngineError> {
        validate_details(&details)?;
        self.repo.get::<Machine>(machine_id)?;
        let mut part = self.machines.find_part(machine_id, item_id)?;

        let mut consumption = Consumption::default();
        if details.replaced {
            consumption.add(&part.item, 1);
        }
        for extra in &details.consumed {
            consumption.add(&extra.item, extra.quantity);
        }

        let mut tx = self.repo.begin();
        let (consumed, _) = consumption.stage(&self.repo, &mut tx)?;

        let previous = part.current_usage;
        part.reset_usage();
        if details.replaced {
            part.mark_replaced();
        }
        tx.update(&part)?;

        let kind = if details.replaced {
            MaintenanceKind::Replacement
        } else {
            MaintenanceKind::UsageReset
        };
        let description = details
            .description
            .clone()
            .unwrap_or_else(|| format!("{} of {}", kind, part.name));
        let mut record = Maintenance::completed(
            machine_id.clone(),
            kind,
            description,
            details.performed_by.trim(),
        );
        record.part = Some(part.id.clone());
        record.parts = consumed.iter().map(|(item, qty)| maintenance_part(item, *qty)).collect();
        record.labor_cost = details.labor_cost;
        record.resolution = details.resolution.clone();
        tx.insert(&record)?;

        tx.commit()?;
        info!(
            part = %part.id,
            maintenance = %record.id,
            previous_usage = previous,
            replaced = details.replaced,
            "usage reset"
        );
        Ok(record)
    }

    /// Swap an installed part for a new unit of a compatible inventory item
    ///
    /// The replacement must be a wear part in stock with the same name or the
    /// same usage unit as the current part.
    pub fn replace_part(
        &self,
        part_id: &EntityId,
        new_item_id: &EntityId,
        performed_by: &str,
    ) -> Result<MachinePart, EngineError> {
        let mut part = self.repo.get::<MachinePart>(part_id)?;
        let item = self.repo.get::<InventoryItem>(new_item_id)?;

        check_compatible(&part, &item)?;
        if item.quantity == 0 {
            return Err(EngineError::InsufficientStock {
                item: item.name.clone(),
                available: 0,
                requested: 1,
            });
        }
        let machine = self.repo.get::<Machine>(&part.machine)?;
        if &part.item != new_item_id && self.machines.has_part(&part.machine, new_item_id)? {
            return Err(EngineError::validation(format!(
                "'{}' is already installed on this machine",
                item.name
            )));
        }
        let max_usage = item.max_lifespan.ok_or_else(|| EngineError::IncompatiblePart {
            part: part.name.clone(),
            replacement: item.name.clone(),
            reason: "replacement has no lifespan".to_string(),
        })?;
        let usage_unit = item.usage_unit.clone().unwrap_or_else(|| part.usage_unit.clone());

        let mut tx = self.repo.begin();
        tx.update(&machine)?;
        let mut consumption = Consumption::default();
        consumption.add(new_item_id, 1);
        let (consumed, _) = consumption.stage(&self.repo, &mut tx)?;

        let old_name = part.name.clone();
        part.item = new_item_id.clone();
        part.name = item.name.clone();
        part.usage_unit = usage_unit;
        part.max_usage = max_usage;
        part.reset_usage();
        part.mark_replaced();
        tx.update(&part)?;

        let mut record = Maintenance::completed(
            part.machine.clone(),
            MaintenanceKind::Replacement,
            format!("Replaced {} with {}", old_name, item.name),
            performed_by.trim(),
        );
        record.part = Some(part.id.clone());
        record.parts = consumed.iter().map(|(item, qty)| maintenance_part(item, *qty)).collect();
        tx.insert(&record)?;

        tx.commit()?;
        info!(part = %part.id, item = %new_item_id, maintenance = %record.id, "part replaced");
        Ok(part.into_inner())
    }
}

fn validate_details(details: &MaintenanceDetails) -> Result<(), EngineError> {
    if details.performed_by.trim().is_empty() {
        return Err(EngineError::validation("maintenance requires a responsible technician"));
    }
    if !details.labor_cost.is_finite() || details.labor_cost < 0.0 {
        return Err(EngineError::validation(format!(
            "labor cost must be a non-negative number, got {}",
            details.labor_cost
        )));
    }
    if let Some(bad) = details.consumed.iter().find(|c| c.quantity == 0) {
        return Err(EngineError::validation(format!(
            "consumed quantity for {} must be at least 1",
            bad.item
        )));
    }
    Ok(())
}

/// Same name (ignoring case) or same usage unit
fn check_compatible(part: &MachinePart, item: &InventoryItem) -> Result<(), EngineError> {
    let incompatible = |reason: String| EngineError::IncompatiblePart {
        part: part.name.clone(),
        replacement: item.name.clone(),
        reason,
    };
    if !item.is_wear_part() {
        return Err(incompatible(format!("replacement is a {}, not a wear part", item.kind)));
    }
    let same_name = item.name.trim().eq_ignore_ascii_case(part.name.trim());
    let same_unit = item.usage_unit.as_deref().map(str::trim) == Some(part.usage_unit.trim());
    if !same_name && !same_unit {
        return Err(incompatible(format!(
            "usage unit '{}' does not match '{}'",
            item.usage_unit.as_deref().unwrap_or("-"),
            part.usage_unit
        )));
    }
    Ok(())
}

pub(crate) fn maintenance_part(item: &InventoryItem, quantity: u32) -> MaintenancePart {
    MaintenancePart {
        item: item.id.clone(),
        name: item.name.clone(),
        quantity,
        unit_cost: item.unit_cost.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory::Inventory;
    use crate::core::store::{Collection, Document, DocumentStore, MemoryStore, StoreError, WriteBatch};
    use crate::entities::inventory::ItemKind;
    use crate::entities::notification::{NotificationKind, Severity};
    use std::sync::Arc;
    use std::time::Duration;

    struct Lab {
        repo: Repository,
        inventory: Inventory,
        machines: Machines,
        engine: UsageEngine,
        machine: Machine,
        item: InventoryItem,
    }

    fn lab(max: f64, stock: u32) -> Lab {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let inventory = Inventory::new(repo.clone());
        let machines = Machines::new(repo.clone());
        let engine = UsageEngine::new(repo.clone());

        let mut item = InventoryItem::wear_part("Rotor seal", "hours", max, "test");
        item.quantity = stock;
        item.unit_cost = Some(20.0);
        let item = inventory.create(item).unwrap();
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();
        machines.install_part(&machine.id, &item.id, false, "test").unwrap();

        Lab {
            repo,
            inventory,
            machines,
            engine,
            machine,
            item,
        }
    }

    impl Lab {
        fn record(&self, amount: f64) -> Result<UsageReceipt, EngineError> {
            self.engine
                .record_usage(&self.machine.id, &self.item.id, amount, "hours", "ana", None)
        }

        fn part(&self) -> MachinePart {
            self.machines
                .find_part(&self.machine.id, &self.item.id)
                .unwrap()
                .into_inner()
        }

        fn notifications(&self) -> Vec<Notification> {
            self.repo
                .all::<Notification>()
                .unwrap()
                .into_iter()
                .map(|n| n.into_inner())
                .collect()
        }

        fn reset(&self, replaced: bool) -> Result<Maintenance, EngineError> {
            self.engine.register_maintenance_reset(
                &self.machine.id,
                &self.item.id,
                MaintenanceDetails {
                    performed_by: "ben".into(),
                    replaced,
                    ..Default::default()
                },
            )
        }
    }

    #[test]
    fn test_threshold_scenario() {
        let lab = lab(100.0, 0);

        let first = lab.record(80.0).unwrap();
        assert!((first.percentage - 80.0).abs() < 1e-9);
        assert_eq!(first.status, PartStatus::Warning);
        assert_eq!(first.alert.as_ref().unwrap().kind, NotificationKind::UsageWarning);
        assert_eq!(lab.notifications().len(), 1);

        let second = lab.record(25.0).unwrap();
        assert!((second.percentage - 105.0).abs() < 1e-9);
        assert_eq!(second.status, PartStatus::Critical);
        let alert = second.alert.unwrap();
        assert_eq!(alert.kind, NotificationKind::UsageCritical);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(lab.notifications().len(), 2);

        lab.reset(false).unwrap();
        let part = lab.part();
        assert_eq!(part.current_usage, 0.0);
        assert_eq!(part.status(), PartStatus::Normal);
        assert_eq!(part.alert_level, PartStatus::Normal);
    }

    #[test]
    fn test_one_alert_per_band() {
        let lab = lab(100.0, 0);
        assert!(lab.record(76.0).unwrap().alert.is_some());
        assert!(lab.record(5.0).unwrap().alert.is_none());
        assert!(lab.record(5.0).unwrap().alert.is_none());
        assert_eq!(lab.notifications().len(), 1);

        assert!(lab.record(20.0).unwrap().alert.is_some());
        assert!(lab.record(50.0).unwrap().alert.is_none());
        assert_eq!(lab.notifications().len(), 2);
    }

    #[test]
    fn test_jump_straight_to_critical_alerts_once() {
        let lab = lab(100.0, 0);
        let receipt = lab.record(150.0).unwrap();
        assert_eq!(receipt.status, PartStatus::Critical);
        assert_eq!(lab.notifications().len(), 1);
        assert_eq!(lab.notifications()[0].kind, NotificationKind::UsageCritical);
    }

    #[test]
    fn test_alerts_again_after_reset() {
        let lab = lab(100.0, 0);
        lab.record(80.0).unwrap();
        lab.reset(false).unwrap();
        assert!(lab.record(80.0).unwrap().alert.is_some());
        assert_eq!(lab.notifications().len(), 2);
    }

    #[test]
    fn test_usage_is_monotonic_and_logged() {
        let lab = lab(1000.0, 0);
        let mut last = 0.0;
        for amount in [1.0, 0.5, 12.25, 3.0] {
            let receipt = lab.record(amount).unwrap();
            assert!(receipt.part.current_usage > last);
            last = receipt.part.current_usage;
        }
        assert!((lab.part().current_usage - 16.75).abs() < 1e-9);
        assert_eq!(lab.repo.all::<UsageLog>().unwrap().len(), 4);
    }

    #[test]
    fn test_record_usage_validation() {
        let lab = lab(100.0, 0);
        assert!(matches!(lab.record(0.0), Err(EngineError::Validation(_))));
        assert!(matches!(lab.record(-3.0), Err(EngineError::Validation(_))));
        assert!(matches!(lab.record(f64::NAN), Err(EngineError::Validation(_))));

        let wrong_unit = lab.engine.record_usage(
            &lab.machine.id,
            &lab.item.id,
            5.0,
            "cycles",
            "ana",
            None,
        );
        assert!(matches!(wrong_unit, Err(EngineError::Validation(_))));

        assert_eq!(lab.part().current_usage, 0.0);
        assert!(lab.repo.all::<UsageLog>().unwrap().is_empty());
    }

    #[test]
    fn test_record_usage_unknown_part() {
        let lab = lab(100.0, 0);
        let other = lab
            .inventory
            .create(InventoryItem::wear_part("Lamp", "hours", 10.0, "test"))
            .unwrap();
        let err = lab
            .engine
            .record_usage(&lab.machine.id, &other.id, 1.0, "hours", "ana", None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err = lab
            .engine
            .record_usage(&EntityId::new(EntityPrefix::Mach), &lab.item.id, 1.0, "hours", "ana", None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "machine", .. }));
    }

    #[test]
    fn test_aggregate_usage_info() {
        let empty = UsageEngine::new(Repository::new(Arc::new(MemoryStore::new())));
        assert!(empty.aggregate_usage_info().unwrap().is_empty());

        let lab = lab(200.0, 0);
        lab.record(160.0).unwrap();
        let info = lab.engine.aggregate_usage_info().unwrap();
        assert_eq!(info.len(), 1);
        let row = &info[0];
        assert_eq!(row.machine_name, "Centrifuge");
        assert_eq!(row.accumulated, 160.0);
        assert!((row.percentage - 80.0).abs() < 1e-9);
        assert_eq!(row.status, PartStatus::Warning);
        assert!(row.alert);
        assert!(!row.requires_maintenance);

        lab.record(40.0).unwrap();
        let info = lab.engine.aggregate_usage_info().unwrap();
        assert!(info[0].requires_maintenance);
    }

    #[test]
    fn test_reset_with_replacement_consumes_stock() {
        let lab = lab(100.0, 2);
        let filter = lab
            .inventory
            .create({
                let mut f = InventoryItem::new("Oil filter", ItemKind::Consumable, "test");
                f.quantity = 5;
                f.unit_cost = Some(4.0);
                f
            })
            .unwrap();
        lab.record(90.0).unwrap();
        let before = lab.part();

        let record = lab
            .engine
            .register_maintenance_reset(
                &lab.machine.id,
                &lab.item.id,
                MaintenanceDetails {
                    performed_by: "ben".into(),
                    replaced: true,
                    consumed: vec![ConsumedPart {
                        item: filter.id.clone(),
                        quantity: 2,
                    }],
                    labor_cost: 30.0,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(record.kind, MaintenanceKind::Replacement);
        assert!(record.is_completed());
        assert!((record.total_cost() - (20.0 + 8.0 + 30.0)).abs() < 1e-9);

        let after = lab.part();
        assert_eq!(after.current_usage, 0.0);
        assert_ne!(after.install_id, before.install_id);
        assert!(after.last_replaced.is_some());
        assert_eq!(lab.inventory.get_inventory_item_by_id(&lab.item.id).unwrap().quantity, 1);
        assert_eq!(lab.inventory.get_inventory_item_by_id(&filter.id).unwrap().quantity, 3);
    }

    #[test]
    fn test_reset_is_atomic_on_insufficient_stock() {
        let lab = lab(100.0, 0);
        lab.record(90.0).unwrap();

        let err = lab.reset(true).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));

        let part = lab.part();
        assert_eq!(part.current_usage, 90.0);
        assert_eq!(part.alert_level, PartStatus::Warning);
        assert!(lab.repo.all::<Maintenance>().unwrap().is_empty());
    }

    #[test]
    fn test_reset_unknown_part_is_not_found() {
        let lab = lab(100.0, 0);
        let err = lab
            .engine
            .register_maintenance_reset(
                &lab.machine.id,
                &EntityId::new(EntityPrefix::Inv),
                MaintenanceDetails {
                    performed_by: "ben".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert!(lab.repo.all::<Maintenance>().unwrap().is_empty());
    }

    #[test]
    fn test_replace_part() {
        let lab = lab(100.0, 0);
        let mut upgrade = InventoryItem::wear_part("Rotor seal HD", "hours", 400.0, "test");
        upgrade.quantity = 1;
        let upgrade = lab.inventory.create(upgrade).unwrap();
        let part_id = lab.part().id;
        lab.record(120.0).unwrap();

        let part = lab.engine.replace_part(&part_id, &upgrade.id, "ben").unwrap();
        assert_eq!(part.id, part_id);
        assert_eq!(part.current_usage, 0.0);
        assert_eq!(part.max_usage, 400.0);
        assert_eq!(part.item, upgrade.id);
        assert_eq!(part.alert_level, PartStatus::Normal);
        assert_eq!(lab.inventory.get_inventory_item_by_id(&upgrade.id).unwrap().quantity, 0);

        let maintenance = lab.repo.all::<Maintenance>().unwrap();
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].kind, MaintenanceKind::Replacement);
    }

    #[test]
    fn test_replace_part_out_of_stock_changes_nothing() {
        let lab = lab(100.0, 0);
        lab.record(50.0).unwrap();
        let before = lab.part();

        let err = lab.engine.replace_part(&before.id, &lab.item.id, "ben").unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { available: 0, .. }));

        let after = lab.part();
        assert_eq!(after.current_usage, 50.0);
        assert_eq!(after.install_id, before.install_id);
        assert_eq!(lab.inventory.get_inventory_item_by_id(&lab.item.id).unwrap().quantity, 0);
    }

    #[test]
    fn test_replace_part_incompatible() {
        let lab = lab(100.0, 0);
        let mut lamp = InventoryItem::wear_part("UV lamp", "cycles", 50.0, "test");
        lamp.quantity = 3;
        let lamp = lab.inventory.create(lamp).unwrap();
        let mut gloves = InventoryItem::new("Rotor seal", ItemKind::Consumable, "test");
        gloves.quantity = 3;
        let gloves = lab.inventory.create(gloves).unwrap();

        let part_id = lab.part().id;
        assert!(matches!(
            lab.engine.replace_part(&part_id, &lamp.id, "ben"),
            Err(EngineError::IncompatiblePart { .. })
        ));
        assert!(matches!(
            lab.engine.replace_part(&part_id, &gloves.id, "ben"),
            Err(EngineError::IncompatiblePart { .. })
        ));
        assert_eq!(lab.inventory.get_inventory_item_by_id(&lamp.id).unwrap().quantity, 3);
    }

    #[test]
    fn test_stale_part_write_conflicts() {
        let lab = lab(100.0, 0);
        let stale = lab.machines.find_part(&lab.machine.id, &lab.item.id).unwrap();
        lab.record(10.0).unwrap();

        let mut tx = lab.repo.begin();
        tx.update(&stale).unwrap();
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
        assert_eq!(lab.part().current_usage, 10.0);
    }

    #[test]
    fn test_store_timeout_is_transient() {
        fn timeout(operation: &'static str) -> StoreError {
            StoreError::Timeout {
                operation,
                timeout: Duration::from_millis(1),
            }
        }

        struct Unavailable;
        impl DocumentStore for Unavailable {
            fn get(&self, _: Collection, _: &str) -> Result<Option<Document>, StoreError> {
                Err(timeout("get"))
            }
            fn list(&self, _: Collection) -> Result<Vec<Document>, StoreError> {
                Err(timeout("list"))
            }
            fn commit(&self, _: WriteBatch) -> Result<(), StoreError> {
                Err(timeout("commit"))
            }
        }

        let engine = UsageEngine::new(Repository::new(Arc::new(Unavailable)));
        let err = engine
            .record_usage(
                &EntityId::new(EntityPrefix::Mach),
                &EntityId::new(EntityPrefix::Inv),
                1.0,
                "hours",
                "ana",
                None,
            )
            .unwrap_err();
        assert!(err.is_transient());
        assert!(engine.aggregate_usage_info().unwrap_err().is_transient());
    }

    #[test]
    fn test_padded_usage_unit_is_recordable() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let inventory = Inventory::new(repo.clone());
        let machines = Machines::new(repo.clone());
        let engine = UsageEngine::new(repo);

        let item = inventory
            .create(InventoryItem::wear_part("Seal", " hours ", 100.0, "test"))
            .unwrap();
        assert_eq!(item.usage_unit.as_deref(), Some("hours"));
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();
        machines.install_part(&machine.id, &item.id, false, "test").unwrap();

        for unit in ["hours", " hours "] {
            engine
                .record_usage(&machine.id, &item.id, 1.0, unit, "ana", None)
                .unwrap();
        }
        let part = machines.find_part(&machine.id, &item.id).unwrap();
        assert_eq!(part.usage_unit, "hours");
        assert_eq!(part.current_usage, 2.0);
    }
}
