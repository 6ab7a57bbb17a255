//! Notification emitter
//!
//! Builds notifications for usage threshold crossings and low stock, and
//! manages the stored notification list. Usage alerts are edge-triggered by
//! the usage engine; this module only decides wording and severity.

use tracing::info;

use crate::core::error::EngineError;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::repo::{Repository, Versioned};
use crate::entities::inventory::{InventoryItem, StockStatus};
use crate::entities::machine::{MachinePart, PartStatus};
use crate::entities::notification::{Notification, NotificationKind, Severity};

/// Build the alert for a part that just entered `status`
///
/// Returns `None` for [`PartStatus::Normal`], which never alerts.
pub fn usage_alert(part: &MachinePart, machine_name: &str, status: PartStatus) -> Option<Notification> {
    let severity = if part.current_usage >= part.max_usage {
        Severity::High
    } else {
        Severity::Medium
    };

    let (kind, title, outlook) = match status {
        PartStatus::Normal => return None,
        PartStatus::Warning => (
            NotificationKind::UsageWarning,
            format!("{} nearing end of life", part.name),
            "plan a replacement",
        ),
        PartStatus::Critical => (
            NotificationKind::UsageCritical,
            format!("{} requires maintenance", part.name),
            "maintenance is required",
        ),
    };

    let message = format!(
        "{} on {} is at {:.1}% of its service life ({} / {} {}); {}.",
        part.name,
        machine_name,
        part.usage_percentage(),
        trim_float(part.current_usage),
        trim_float(part.max_usage),
        part.usage_unit,
        outlook
    );

    Some(Notification::new(
        kind,
        severity,
        title,
        message,
        Some(part.id.clone()),
    ))
}

/// Build the alert for an item whose stock level moved from `before` to its current level
///
/// Only a move into a worse level alerts.
pub fn stock_alert(item: &InventoryItem, before: StockStatus) -> Option<Notification> {
    let after = item.stock_status();
    if after <= before {
        return None;
    }
    let (severity, title) = match after {
        StockStatus::InStock => return None,
        StockStatus::LowStock => (Severity::Low, format!("{} is running low", item.name)),
        StockStatus::OutOfStock => (Severity::Medium, format!("{} is out of stock", item.name)),
    };
    let message = format!(
        "{} has {} unit(s) left (minimum {}).",
        item.name, item.quantity, item.min_quantity
    );
    Some(Notification::new(
        NotificationKind::LowStock,
        severity,
        title,
        message,
        Some(item.id.clone()),
    ))
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Filter for listing notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationFilter {
    pub unread_only: bool,
    pub min_severity: Option<Severity>,
}

/// Stored notification list
#[derive(Clone)]
pub struct Notifier {
    repo: Repository,
}

impl Notifier {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store a notification
    pub fn create(&self, notification: Notification) -> Result<Notification, EngineError> {
        let mut tx = self.repo.begin();
        tx.insert(&notification)?;
        tx.commit()?;
        info!(id = %notification.id, kind = %notification.kind, "notification created");
        Ok(notification)
    }

    /// Notifications matching the filter, newest first
    pub fn list(&self, filter: NotificationFilter) -> Result<Vec<Notification>, EngineError> {
        let mut notifications: Vec<Notification> = self
            .repo
            .all::<Notification>()?
            .into_iter()
            .map(|n| n.into_inner())
            .filter(|n| !filter.unread_only || !n.read)
            .filter(|n| filter.min_severity.is_none_or(|min| n.severity >= min))
            .collect();
        notifications.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(notifications)
    }

    /// Mark one notification as read
    ///
    /// Returns `false` if no such notification exists.
    pub fn mark_read(&self, id: &EntityId) -> Result<bool, EngineError> {
        let Some(mut record) = self.lookup(id)? else {
            return Ok(false);
        };
        if !record.read {
            record.read = true;
            let mut tx = self.repo.begin();
            tx.update(&record)?;
            tx.commit()?;
        }
        Ok(true)
    }

    /// Mark every unread notification as read, returning how many changed
    pub fn mark_all_read(&self) -> Result<usize, EngineError> {
        let mut tx = self.repo.begin();
        let mut count = 0;
        for mut record in self.repo.all::<Notification>()? {
            if !record.read {
                record.read = true;
                tx.update(&record)?;
                count += 1;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// Delete one notification
    ///
    /// Returns `false` if no such notification exists.
    pub fn delete(&self, id: &EntityId) -> Result<bool, EngineError> {
        let Some(record) = self.lookup(id)? else {
            return Ok(false);
        };
        let mut tx = self.repo.begin();
        tx.delete(&record);
        tx.commit()?;
        info!(id = %id, "notification deleted");
        Ok(true)
    }

    /// IDs of any other entity kind name no notification
    fn lookup(&self, id: &EntityId) -> Result<Option<Versioned<Notification>>, EngineError> {
        if id.prefix() != EntityPrefix::Ntf {
            return Ok(None);
        }
        self.repo.find::<Notification>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::store::MemoryStore;
    use crate::entities::inventory::ItemKind;
    use crate::entities::machine::Machine;
    use std::sync::Arc;

    fn notifier() -> Notifier {
        Notifier::new(Repository::new(Arc::new(MemoryStore::new())))
    }

    fn part_at(usage: f64) -> MachinePart {
        let machine = Machine::new("HPLC", "1260", "test");
        let item = InventoryItem::wear_part("Pump seal", "hours", 100.0, "test");
        let mut part = MachinePart::install(&machine.id, &item, "test").unwrap();
        part.current_usage = usage;
        part
    }

    #[test]
    fn test_usage_alert_severity() {
        let warning = usage_alert(&part_at(80.0), "HPLC", PartStatus::Warning).unwrap();
        assert_eq!(warning.kind, NotificationKind::UsageWarning);
        assert_eq!(warning.severity, Severity::Medium);
        assert!(warning.message.contains("80.0%"));

        let critical = usage_alert(&part_at(105.0), "HPLC", PartStatus::Critical).unwrap();
        assert_eq!(critical.kind, NotificationKind::UsageCritical);
        assert_eq!(critical.severity, Severity::High);
        assert!(critical.message.contains("105 / 100 hours"));

        assert!(usage_alert(&part_at(10.0), "HPLC", PartStatus::Normal).is_none());
    }

    #[test]
    fn test_stock_alert_only_on_worsening() {
        let mut item = InventoryItem::new("Filters", ItemKind::Consumable, "test");
        item.min_quantity = 2;
        item.quantity = 2;
        let alert = stock_alert(&item, StockStatus::InStock).unwrap();
        assert_eq!(alert.severity, Severity::Low);

        assert!(stock_alert(&item, StockStatus::LowStock).is_none());

        item.quantity = 0;
        let out = stock_alert(&item, StockStatus::LowStock).unwrap();
        assert_eq!(out.severity, Severity::Medium);

        item.quantity = 5;
        assert!(stock_alert(&item, StockStatus::OutOfStock).is_none());
    }

    #[test]
    fn test_create_list_mark_read() {
        let notifier = notifier();
        let n = notifier
            .create(Notification::new(
                NotificationKind::LowStock,
                Severity::Low,
                "Low",
                "Filters low",
                None,
            ))
            .unwrap();

        let unread = notifier
            .list(NotificationFilter {
                unread_only: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(unread.len(), 1);

        assert!(notifier.mark_read(&n.id).unwrap());
        let unread = notifier
            .list(NotificationFilter {
                unread_only: true,
                ..Default::default()
            })
            .unwrap();
        assert!(unread.is_empty());
        assert_eq!(notifier.list(NotificationFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_ids_return_false() {
        let notifier = notifier();
        let missing = EntityId::new(EntityPrefix::Ntf);
        assert!(!notifier.mark_read(&missing).unwrap());
        assert!(!notifier.delete(&missing).unwrap());

        let machine = EntityId::new(EntityPrefix::Mach);
        assert!(!notifier.mark_read(&machine).unwrap());
        assert!(!notifier.delete(&machine).unwrap());
    }

    #[test]
    fn test_delete_and_mark_all() {
        let notifier = notifier();
        let a = notifier
            .create(Notification::new(NotificationKind::LowStock, Severity::Low, "a", "a", None))
            .unwrap();
        notifier
            .create(Notification::new(NotificationKind::LowStock, Severity::High, "b", "b", None))
            .unwrap();

        assert_eq!(notifier.mark_all_read().unwrap(), 2);
        assert_eq!(notifier.mark_all_read().unwrap(), 0);

        assert!(notifier.delete(&a.id).unwrap());
        let remaining = notifier.list(NotificationFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "b");

        let high = notifier
            .list(NotificationFilter {
                min_severity: Some(Severity::High),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(high.len(), 1);
    }
}
