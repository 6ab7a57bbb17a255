//! Maintenance workflow - scheduling and completing maintenance on machines

use chrono::{DateTime, Utc};
use tracing::info;

use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::inventory::Consumption;
use crate::core::repo::{Repository, Versioned};
use crate::core::usage::{maintenance_part, ConsumedPart};
use crate::entities::machine::Machine;
use crate::entities::maintenance::{Maintenance, MaintenanceKind, MaintenanceStatus};

/// A maintenance to be scheduled
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub machine: EntityId,
    pub kind: MaintenanceKind,
    pub description: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub labor_cost: f64,
    pub author: String,
}

/// Maintenance workflow collaborator
#[derive(Clone)]
pub struct MaintenanceWorkflow {
    repo: Repository,
}

impl MaintenanceWorkflow {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn schedule(&self, request: ScheduleRequest) -> Result<Maintenance, EngineError> {
        if request.description.trim().is_empty() {
            return Err(EngineError::validation("maintenance description must not be empty"));
        }
        if !request.labor_cost.is_finite() || request.labor_cost < 0.0 {
            return Err(EngineError::validation("labor cost must be a non-negative number"));
        }
        self.repo.get::<Machine>(&request.machine)?;

        let mut record = Maintenance::scheduled(
            request.machine,
            request.kind,
            request.description.trim(),
            request.author,
        );
        record.scheduled_for = request.scheduled_for;
        record.labor_cost = request.labor_cost;

        let mut tx = self.repo.begin();
        tx.insert(&record)?;
        tx.commit()?;
        info!(id = %record.id, machine = %record.machine, kind = %record.kind, "maintenance scheduled");
        Ok(record)
    }

    /// Complete a scheduled maintenance, deducting consumed inventory
    pub fn complete(
        &self,
        id: &EntityId,
        performed_by: &str,
        consumed: &[ConsumedPart],
        resolution: Option<String>,
    ) -> Result<Maintenance, EngineError> {
        if performed_by.trim().is_empty() {
            return Err(EngineError::validation("maintenance requires a responsible technician"));
        }
        let mut record = self.repo.get::<Maintenance>(id)?;
        if record.is_completed() {
            return Err(EngineError::validation(format!("{} is already completed", id)));
        }

        let mut consumption = Consumption::default();
        for part in consumed {
            if part.quantity == 0 {
                return Err(EngineError::validation(format!(
                    "consumed quantity for {} must be at least 1",
                    part.item
                )));
            }
            consumption.add(&part.item, part.quantity);
        }

        let mut tx = self.repo.begin();
        let (items, _) = consumption.stage(&self.repo, &mut tx)?;

        let now = Utc::now();
        record.status = MaintenanceStatus::Completed;
        record.completed = Some(now);
        record.performed_by = Some(performed_by.trim().to_string());
        record
            .parts
            .extend(items.iter().map(|(item, qty)| maintenance_part(item, *qty)));
        if resolution.is_some() {
            record.resolution = resolution;
        }
        tx.update(&record)?;
        tx.commit()?;

        info!(id = %id, parts = record.parts.len(), cost = record.total_cost(), "maintenance completed");
        Ok(record.into_inner())
    }

    /// Update resolution notes; allowed in any status
    pub fn set_resolution(&self, id: &EntityId, text: &str) -> Result<Maintenance, EngineError> {
        let mut record = self.repo.get::<Maintenance>(id)?;
        let text = text.trim();
        record.resolution = (!text.is_empty()).then(|| text.to_string());
        let mut tx = self.repo.begin();
        tx.update(&record)?;
        tx.commit()?;
        Ok(record.into_inner())
    }

    pub fn get(&self, id: &EntityId) -> Result<Maintenance, EngineError> {
        Ok(self.repo.get::<Maintenance>(id)?.into_inner())
    }

    /// Maintenance records, newest first, optionally for one machine
    pub fn list(&self, machine: Option<&EntityId>) -> Result<Vec<Maintenance>, EngineError> {
        let mut records: Vec<Maintenance> = self
            .repo
            .all::<Maintenance>()?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|m| machine.is_none_or(|id| &m.machine == id))
            .collect();
        records.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::inventory::Inventory;
    use crate::core::machines::Machines;
    use crate::core::store::MemoryStore;
    use crate::entities::inventory::{InventoryItem, ItemKind};
    use std::sync::Arc;

    struct Fixture {
        inventory: Inventory,
        workflow: MaintenanceWorkflow,
        machine: Machine,
    }

    fn fixture() -> Fixture {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let machine = Machines::new(repo.clone())
            .create(Machine::new("Autoclave", "A-40", "test"))
            .unwrap();
        Fixture {
            inventory: Inventory::new(repo.clone()),
            workflow: MaintenanceWorkflow::new(repo),
            machine,
        }
    }

    fn request(machine: &EntityId) -> ScheduleRequest {
        ScheduleRequest {
            machine: machine.clone(),
            kind: MaintenanceKind::Preventive,
            description: "Door gasket inspection".into(),
            scheduled_for: None,
            labor_cost: 15.0,
            author: "ana".into(),
        }
    }

    #[test]
    fn test_schedule_and_complete() {
        let f = fixture();
        let mut gasket = InventoryItem::new("Gasket", ItemKind::GeneralSpare, "test");
        gasket.quantity = 3;
        gasket.unit_cost = Some(10.0);
        let gasket = f.inventory.create(gasket).unwrap();

        let scheduled = f.workflow.schedule(request(&f.machine.id)).unwrap();
        assert!(!scheduled.is_completed());

        let done = f
            .workflow
            .complete(
                &scheduled.id,
                "ben",
                &[ConsumedPart {
                    item: gasket.id.clone(),
                    quantity: 2,
                }],
                Some("Gasket replaced".into()),
            )
            .unwrap();
        assert!(done.is_completed());
        assert_eq!(done.performed_by.as_deref(), Some("ben"));
        assert!((done.total_cost() - 35.0).abs() < 1e-9);
        assert_eq!(f.inventory.get_inventory_item_by_id(&gasket.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_second_completion_is_rejected() {
        let f = fixture();
        let scheduled = f.workflow.schedule(request(&f.machine.id)).unwrap();
        f.workflow.complete(&scheduled.id, "ben", &[], None).unwrap();
        let err = f.workflow.complete(&scheduled.id, "ben", &[], None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_complete_short_stock_leaves_record_scheduled() {
        let f = fixture();
        let gasket = f
            .inventory
            .create(InventoryItem::new("Gasket", ItemKind::GeneralSpare, "test"))
            .unwrap();
        let scheduled = f.workflow.schedule(request(&f.machine.id)).unwrap();

        let err = f
            .workflow
            .complete(
                &scheduled.id,
                "ben",
                &[ConsumedPart {
                    item: gasket.id.clone(),
                    quantity: 1,
                }],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));
        assert!(!f.workflow.get(&scheduled.id).unwrap().is_completed());
    }

    #[test]
    fn test_resolution_editable_after_completion() {
        let f = fixture();
        let scheduled = f.workflow.schedule(request(&f.machine.id)).unwrap();
        f.workflow.complete(&scheduled.id, "ben", &[], None).unwrap();
        let updated = f.workflow.set_resolution(&scheduled.id, "All good").unwrap();
        assert_eq!(updated.resolution.as_deref(), Some("All good"));
        assert!(updated.is_completed());
    }

    #[test]
    fn test_schedule_unknown_machine_and_list_filter() {
        let f = fixture();
        let err = f
            .workflow
            .schedule(request(&EntityId::new(EntityPrefix::Mach)))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        f.workflow.schedule(request(&f.machine.id)).unwrap();
        f.workflow.schedule(request(&f.machine.id)).unwrap();
        assert_eq!(f.workflow.list(Some(&f.machine.id)).unwrap().len(), 2);
        assert!(f
            .workflow
            .list(Some(&EntityId::new(EntityPrefix::Mach)))
            .unwrap()
            .is_empty());
        assert_eq!(f.workflow.list(None).unwrap().len(), 2);
    }
}
