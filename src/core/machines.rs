//! Machine registry - machines and the wear parts installed on them

use tracing::info;

use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::inventory::Consumption;
use crate::core::repo::{Repository, Versioned};
use crate::entities::inventory::InventoryItem;
use crate::entities::machine::{Machine, MachinePart, MachineStatus};

/// Machine collaborator
#[derive(Clone)]
pub struct Machines {
    repo: Repository,
}

impl Machines {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store a new machine
    pub fn create(&self, machine: Machine) -> Result<Machine, EngineError> {
        if machine.name.trim().is_empty() {
            return Err(EngineError::validation("machine name must not be empty"));
        }
        if let Some(item) = &machine.inventory_item {
            self.repo.get::<InventoryItem>(item)?;
        }
        let mut tx = self.repo.begin();
        tx.insert(&machine)?;
        tx.commit()?;
        info!(id = %machine.id, name = %machine.name, "machine created");
        Ok(machine)
    }

    pub fn get_machine_by_id(&self, id: &EntityId) -> Result<Machine, EngineError> {
        Ok(self.repo.get::<Machine>(id)?.into_inner())
    }

    /// All machines sorted by name
    pub fn list(&self) -> Result<Vec<Machine>, EngineError> {
        let mut machines: Vec<Machine> = self
            .repo
            .all::<Machine>()?
            .into_iter()
            .map(Versioned::into_inner)
            .collect();
        machines.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(machines)
    }

    /// Parts installed on a machine
    pub fn get_machine_parts(&self, machine_id: &EntityId) -> Result<Vec<MachinePart>, EngineError> {
        self.repo.get::<Machine>(machine_id)?;
        Ok(self
            .parts_of(machine_id)?
            .into_iter()
            .map(Versioned::into_inner)
            .collect())
    }

    pub(crate) fn parts_of(&self, machine_id: &EntityId) -> Result<Vec<Versioned<MachinePart>>, EngineError> {
        let mut parts: Vec<_> = self
            .repo
            .all::<MachinePart>()?
            .into_iter()
            .filter(|p| &p.machine == machine_id)
            .collect();
        parts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parts)
    }

    /// The part on `machine_id` instantiated from `item_id`
    pub(crate) fn find_part(
        &self,
        machine_id: &EntityId,
        item_id: &EntityId,
    ) -> Result<Versioned<MachinePart>, EngineError> {
        self.parts_of(machine_id)?
            .into_iter()
            .find(|p| &p.item == item_id)
            .ok_or_else(|| EngineError::not_found("machine part", format!("{} on {}", item_id, machine_id)))
    }

    /// Whether a part from `item_id` is installed on `machine_id`
    pub(crate) fn has_part(&self, machine_id: &EntityId, item_id: &EntityId) -> Result<bool, EngineError> {
        match self.find_part(machine_id, item_id) {
            Ok(_) => Ok(true),
            Err(EngineError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn set_status(&self, id: &EntityId, status: MachineStatus) -> Result<Machine, EngineError> {
        let mut record = self.repo.get::<Machine>(id)?;
        if record.status != status {
            record.status = status;
            let mut tx = self.repo.begin();
            tx.update(&record)?;
            tx.commit()?;
            info!(id = %id, status = %status, "machine status changed");
        }
        Ok(record.into_inner())
    }

    /// Delete a machine together with its installed parts
    pub fn delete(&self, id: &EntityId) -> Result<Machine, EngineError> {
        let record = self.repo.get::<Machine>(id)?;
        let parts = self.parts_of(id)?;
        let mut tx = self.repo.begin();
        for part in &parts {
            tx.delete(part);
        }
        tx.delete(&record);
        tx.commit()?;
        info!(id = %id, parts = parts.len(), "machine deleted");
        Ok(record.into_inner())
    }

    /// Install a wear part from inventory on a machine
    ///
    /// The new part starts a fresh usage epoch with `max_usage` taken from the
    /// item's lifespan. With `consume_stock` one unit is taken from inventory.
    ///
    /// The machine and the item are rewritten at the versions read here, so a
    /// concurrent install of the same pair, or a concurrent delete of either,
    /// fails the commit with a conflict.
    pub fn install_part(
        &self,
        machine_id: &EntityId,
        item_id: &EntityId,
        consume_stock: bool,
        author: &str,
    ) -> Result<MachinePart, EngineError> {
        let machine = self.repo.get::<Machine>(machine_id)?;
        let item = self.repo.get::<InventoryItem>(item_id)?;
        if !item.is_wear_part() {
            return Err(EngineError::validation(format!(
                "'{}' is a {}, only wear parts can be installed",
                item.name, item.kind
            )));
        }
        if self.has_part(machine_id, item_id)? {
            return Err(EngineError::validation(format!(
                "'{}' is already installed on {}; replace it instead",
                item.name, machine.name
            )));
        }
        let part = MachinePart::install(machine_id, &item, author).ok_or_else(|| {
            EngineError::validation(format!("'{}' has no usage unit or lifespan", item.name))
        })?;

        let mut tx = self.repo.begin();
        tx.update(&machine)?;
        if consume_stock {
            let mut consumption = Consumption::default();
            consumption.add(item_id, 1);
            consumption.stage(&self.repo, &mut tx)?;
        } else {
            tx.update(&item)?;
        }
        tx.insert(&part)?;
        tx.commit()?;
        info!(part = %part.id, machine = %machine_id, item = %item_id, "part installed");
        Ok(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::inventory::Inventory;
    use crate::core::store::{Collection, Document, DocumentStore, MemoryStore, StoreError, WriteBatch};
    use crate::entities::inventory::ItemKind;
    use crate::entities::machine::PartStatus;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    /// Memory store with a slow part listing
    struct SlowParts(MemoryStore);

    impl DocumentStore for SlowParts {
        fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.0.get(collection, id)
        }

        fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
            if collection == Collection::Parts {
                thread::sleep(Duration::from_millis(100));
            }
            self.0.list(collection)
        }

        fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
            self.0.commit(batch)
        }
    }

    fn slow_setup() -> (Inventory, Machines) {
        let repo = Repository::new(Arc::new(SlowParts(MemoryStore::new())));
        (Inventory::new(repo.clone()), Machines::new(repo))
    }

    fn setup() -> (Inventory, Machines) {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        (Inventory::new(repo.clone()), Machines::new(repo))
    }

    fn seal(inv: &Inventory, qty: u32) -> InventoryItem {
        let mut item = InventoryItem::wear_part("Rotor seal", "hours", 500.0, "test");
        item.quantity = qty;
        inv.create(item).unwrap()
    }

    #[test]
    fn test_install_part_consumes_stock() {
        let (inv, machines) = setup();
        let item = seal(&inv, 2);
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();

        let part = machines.install_part(&machine.id, &item.id, true, "ana").unwrap();
        assert_eq!(part.max_usage, 500.0);
        assert_eq!(part.status(), PartStatus::Normal);
        assert_eq!(inv.get_inventory_item_by_id(&item.id).unwrap().quantity, 1);

        let parts = machines.get_machine_parts(&machine.id).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].id, part.id);
    }

    #[test]
    fn test_install_without_stock() {
        let (inv, machines) = setup();
        let item = seal(&inv, 0);
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();

        let err = machines.install_part(&machine.id, &item.id, true, "ana").unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));
        assert!(machines.get_machine_parts(&machine.id).unwrap().is_empty());

        machines.install_part(&machine.id, &item.id, false, "ana").unwrap();
        assert_eq!(machines.get_machine_parts(&machine.id).unwrap().len(), 1);
    }

    #[test]
    fn test_install_rejects_duplicates_and_non_wear_items() {
        let (inv, machines) = setup();
        let item = seal(&inv, 5);
        let spare = inv
            .create(InventoryItem::new("Fuse", ItemKind::GeneralSpare, "test"))
            .unwrap();
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();

        machines.install_part(&machine.id, &item.id, true, "ana").unwrap();
        assert!(matches!(
            machines.install_part(&machine.id, &item.id, true, "ana"),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            machines.install_part(&machine.id, &spare.id, false, "ana"),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(inv.get_inventory_item_by_id(&item.id).unwrap().quantity, 4);
    }

    #[test]
    fn test_delete_machine_removes_parts() {
        let (inv, machines) = setup();
        let item = seal(&inv, 1);
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();
        machines.install_part(&machine.id, &item.id, false, "ana").unwrap();

        machines.delete(&machine.id).unwrap();
        assert!(machines.get_machine_by_id(&machine.id).is_err());
        assert!(machines.find_part(&machine.id, &item.id).is_err());
        inv.delete(&item.id).unwrap();
    }

    #[test]
    fn test_set_status_and_unknown_machine() {
        let (_, machines) = setup();
        let machine = machines.create(Machine::new("Incubator", "I-2", "test")).unwrap();
        let updated = machines
            .set_status(&machine.id, MachineStatus::Inoperative)
            .unwrap();
        assert_eq!(updated.status, MachineStatus::Inoperative);

        let err = machines
            .get_machine_parts(&EntityId::new(EntityPrefix::Mach))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "machine", .. }));
    }

    #[test]
    fn test_concurrent_installs_of_same_pair_conflict() {
        let (inv, machines) = slow_setup();
        let item = seal(&inv, 0);
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let machines = machines.clone();
                let barrier = Arc::clone(&barrier);
                let (machine_id, item_id) = (machine.id.clone(), item.id.clone());
                thread::spawn(move || {
                    barrier.wait();
                    machines.install_part(&machine_id, &item_id, false, "ana")
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().all(|r| matches!(
            r,
            Ok(_) | Err(EngineError::Conflict { .. }) | Err(EngineError::Validation(_))
        )));
        assert_eq!(machines.get_machine_parts(&machine.id).unwrap().len(), 1);
    }

    #[test]
    fn test_item_delete_racing_install() {
        let (inv, machines) = slow_setup();
        let item = seal(&inv, 1);
        let machine = machines.create(Machine::new("Centrifuge", "C-100", "test")).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let deleter = {
            let inv = inv.clone();
            let barrier = Arc::clone(&barrier);
            let item_id = item.id.clone();
            thread::spawn(move || {
                barrier.wait();
                inv.delete(&item_id)
            })
        };
        let installer = {
            let machines = machines.clone();
            let barrier = Arc::clone(&barrier);
            let (machine_id, item_id) = (machine.id.clone(), item.id.clone());
            thread::spawn(move || {
                barrier.wait();
                machines.install_part(&machine_id, &item_id, true, "ana")
            })
        };
        let deleted = deleter.join().unwrap();
        let installed = installer.join().unwrap();

        assert!(deleted.is_ok() != installed.is_ok());
        let parts = machines.get_machine_parts(&machine.id).unwrap();
        if deleted.is_ok() {
            assert!(parts.is_empty());
            assert!(inv.get_inventory_item_by_id(&item.id).is_err());
        } else {
            assert_eq!(parts.len(), 1);
            assert_eq!(inv.get_inventory_item_by_id(&item.id).unwrap().quantity, 0);
        }
    }

    #[test]
    fn test_has_part_propagates_store_errors() {
        struct Broken;
        impl DocumentStore for Broken {
            fn get(&self, _: Collection, _: &str) -> Result<Option<Document>, StoreError> {
                Err(StoreError::Backend("disk gone".into()))
            }
            fn list(&self, _: Collection) -> Result<Vec<Document>, StoreError> {
                Err(StoreError::Backend("disk gone".into()))
            }
            fn commit(&self, _: WriteBatch) -> Result<(), StoreError> {
                Err(StoreError::Backend("disk gone".into()))
            }
        }

        let machines = Machines::new(Repository::new(Arc::new(Broken)));
        let err = machines
            .has_part(&EntityId::new(EntityPrefix::Mach), &EntityId::new(EntityPrefix::Inv))
            .unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
