//! Incident reports against machines

use chrono::Utc;
use tracing::{info, warn};

use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::repo::{Repository, Versioned};
use crate::entities::incident::{Incident, IncidentStatus};
use crate::entities::machine::Machine;
use crate::entities::notification::Severity;

#[derive(Clone)]
pub struct Incidents {
    repo: Repository,
}

impl Incidents {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn report(
        &self,
        machine_id: &EntityId,
        title: &str,
        description: Option<&str>,
        severity: Severity,
        reported_by: &str,
    ) -> Result<Incident, EngineError> {
        if title.trim().is_empty() {
            return Err(EngineError::validation("incident title must not be empty"));
        }
        self.repo.get::<Machine>(machine_id)?;

        let mut incident = Incident::new(machine_id.clone(), title.trim(), severity, reported_by);
        incident.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let mut tx = self.repo.begin();
        tx.insert(&incident)?;
        tx.commit()?;
        if severity == Severity::High {
            warn!(id = %incident.id, machine = %machine_id, "high severity incident reported");
        } else {
            info!(id = %incident.id, machine = %machine_id, "incident reported");
        }
        Ok(incident)
    }

    pub fn resolve(&self, id: &EntityId, resolution: &str) -> Result<Incident, EngineError> {
        let mut record = self.repo.get::<Incident>(id)?;
        if !record.is_open() {
            return Err(EngineError::validation(format!("{} is already resolved", id)));
        }
        record.status = IncidentStatus::Resolved;
        record.resolved = Some(Utc::now());
        let resolution = resolution.trim();
        record.resolution = (!resolution.is_empty()).then(|| resolution.to_string());

        let mut tx = self.repo.begin();
        tx.update(&record)?;
        tx.commit()?;
        info!(id = %id, "incident resolved");
        Ok(record.into_inner())
    }

    pub fn get(&self, id: &EntityId) -> Result<Incident, EngineError> {
        Ok(self.repo.get::<Incident>(id)?.into_inner())
    }

    /// Incidents newest first, optionally only open ones
    pub fn list(&self, open_only: bool) -> Result<Vec<Incident>, EngineError> {
        let mut incidents: Vec<Incident> = self
            .repo
            .all::<Incident>()?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|i| !open_only || i.is_open())
            .collect();
        incidents.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(incidents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::core::machines::Machines;
    use crate::core::store::MemoryStore;
    use std::sync::Arc;

    fn setup() -> (Incidents, Machine) {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let machine = Machines::new(repo.clone())
            .create(Machine::new("Fume hood", "FH-3", "test"))
            .unwrap();
        (Incidents::new(repo), machine)
    }

    #[test]
    fn test_report_and_resolve() {
        let (incidents, machine) = setup();
        let incident = incidents
            .report(&machine.id, "Airflow alarm", Some("  "), Severity::High, "ana")
            .unwrap();
        assert!(incident.is_open());
        assert!(incident.description.is_none());

        let resolved = incidents.resolve(&incident.id, "Sensor recalibrated").unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resolved);
        assert!(resolved.resolved.is_some());

        let err = incidents.resolve(&incident.id, "again").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_list_open_only() {
        let (incidents, machine) = setup();
        let first = incidents
            .report(&machine.id, "Noise", None, Severity::Low, "ana")
            .unwrap();
        incidents
            .report(&machine.id, "Leak", None, Severity::Medium, "ben")
            .unwrap();
        incidents.resolve(&first.id, "").unwrap();

        assert_eq!(incidents.list(false).unwrap().len(), 2);
        let open = incidents.list(true).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "Leak");
    }

    #[test]
    fn test_report_requires_machine() {
        let (incidents, _) = setup();
        let err = incidents
            .report(&EntityId::new(EntityPrefix::Mach), "Noise", None, Severity::Low, "ana")
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
