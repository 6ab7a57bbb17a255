//! Report export - flat records for usage, maintenance and usage logs
//!
//! Rows are plain serializable structs so the same data can be rendered as
//! a table, CSV, JSON or YAML by the caller.

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::error::EngineError;
use crate::core::identity::EntityId;
use crate::core::repo::{Repository, Versioned};
use crate::core::usage::{UsageEngine, UsageInfo};
use crate::entities::machine::{Machine, PartStatus};
use crate::entities::maintenance::{Maintenance, MaintenanceKind, MaintenanceStatus};
use crate::entities::usage_log::UsageLog;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Usage dashboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub machine: String,
    pub part: String,
    pub unit: String,
    pub accumulated: f64,
    pub max_usage: f64,
    pub percentage: f64,
    pub status: PartStatus,
    pub requires_maintenance: bool,
    pub part_id: String,
}

impl From<UsageInfo> for UsageRow {
    fn from(u: UsageInfo) -> Self {
        Self {
            machine: u.machine_name,
            part: u.part_name,
            unit: u.unit,
            accumulated: u.accumulated,
            max_usage: u.max_usage,
            percentage: (u.percentage * 10.0).round() / 10.0,
            status: u.status,
            requires_maintenance: u.requires_maintenance,
            part_id: u.part.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceRow {
    pub id: String,
    pub machine: String,
    pub kind: MaintenanceKind,
    pub status: MaintenanceStatus,
    pub description: String,
    pub performed_by: String,
    pub date: DateTime<Utc>,
    pub parts_cost: f64,
    pub labor_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageLogRow {
    pub date: DateTime<Utc>,
    pub machine: String,
    pub part_id: String,
    pub amount: f64,
    pub unit: String,
    pub responsible: String,
    pub notes: String,
}

/// Builds report rows from the store
#[derive(Clone)]
pub struct Reports {
    repo: Repository,
}

impl Reports {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    fn machine_names(&self) -> Result<HashMap<EntityId, String>, EngineError> {
        Ok(self
            .repo
            .all::<Machine>()?
            .into_iter()
            .map(|m| {
                let m = m.into_inner();
                (m.id, m.name)
            })
            .collect())
    }

    /// Usage dashboard, most worn parts first
    pub fn usage(&self) -> Result<Vec<UsageRow>, EngineError> {
        let mut info = UsageEngine::new(self.repo.clone()).aggregate_usage_info()?;
        info.sort_by(|a, b| {
            b.percentage
                .total_cmp(&a.percentage)
                .then_with(|| a.machine_name.cmp(&b.machine_name))
        });
        Ok(info.into_iter().map(UsageRow::from).collect())
    }

    /// Maintenance history, newest first
    pub fn maintenance(&self, machine: Option<&EntityId>) -> Result<Vec<MaintenanceRow>, EngineError> {
        let names = self.machine_names()?;
        let mut records: Vec<Maintenance> = self
            .repo
            .all::<Maintenance>()?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|m| machine.is_none_or(|id| &m.machine == id))
            .collect();
        records.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(records
            .into_iter()
            .map(|m| {
                let parts_cost = m.total_cost() - m.labor_cost;
                MaintenanceRow {
                    id: m.id.to_string(),
                    machine: machine_label(&names, &m.machine),
                    kind: m.kind,
                    status: m.status,
                    performed_by: m.performed_by.clone().unwrap_or_default(),
                    date: m.completed.or(m.scheduled_for).unwrap_or(m.created),
                    parts_cost,
                    labor_cost: m.labor_cost,
                    total_cost: m.total_cost(),
                    description: m.description,
                }
            })
            .collect())
    }

    /// Usage log entries, newest first, optionally filtered
    pub fn usage_logs(
        &self,
        machine: Option<&EntityId>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageLogRow>, EngineError> {
        let names = self.machine_names()?;
        let mut logs: Vec<UsageLog> = self
            .repo
            .all::<UsageLog>()?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|l| machine.is_none_or(|id| &l.machine == id))
            .filter(|l| since.is_none_or(|t| l.date >= t))
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs
            .into_iter()
            .map(|l| UsageLogRow {
                date: l.date,
                machine: machine_label(&names, &l.machine),
                part_id: l.part.to_string(),
                amount: l.amount,
                unit: l.unit,
                responsible: l.responsible,
                notes: l.notes.unwrap_or_default(),
            })
            .collect())
    }
}

fn machine_label(names: &HashMap<EntityId, String>, id: &EntityId) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write, R: Serialize>(writer: W, rows: &[R]) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write rows as a pretty JSON array
pub fn write_json<W: Write, R: Serialize>(mut writer: W, rows: &[R]) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory::Inventory;
    use crate::core::machines::Machines;
    use crate::core::store::MemoryStore;
    use crate::core::usage::MaintenanceDetails;
    use crate::entities::inventory::InventoryItem;
    use std::sync::Arc;

    fn populated() -> Reports {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let inventory = Inventory::new(repo.clone());
        let machines = Machines::new(repo.clone());
        let engine = UsageEngine::new(repo.clone());

        let seal = inventory
            .create(InventoryItem::wear_part("Seal", "hours", 100.0, "test"))
            .unwrap();
        let lamp = inventory
            .create(InventoryItem::wear_part("Lamp", "hours", 1000.0, "test"))
            .unwrap();
        let machine = machines.create(Machine::new("HPLC", "1260", "test")).unwrap();
        machines.install_part(&machine.id, &seal.id, false, "test").unwrap();
        machines.install_part(&machine.id, &lamp.id, false, "test").unwrap();

        engine
            .record_usage(&machine.id, &seal.id, 90.0, "hours", "ana", Some("run, batch 7"))
            .unwrap();
        engine
            .record_usage(&machine.id, &lamp.id, 100.0, "hours", "ana", None)
            .unwrap();
        engine
            .register_maintenance_reset(
                &machine.id,
                &lamp.id,
                MaintenanceDetails {
                    performed_by: "ben".into(),
                    labor_cost: 12.5,
                    ..Default::default()
                },
            )
            .unwrap();
        Reports::new(repo)
    }

    #[test]
    fn test_usage_rows_sorted_by_wear() {
        let rows = populated().usage().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part, "Seal");
        assert_eq!(rows[0].percentage, 90.0);
        assert_eq!(rows[0].status, PartStatus::Warning);
        assert_eq!(rows[1].accumulated, 0.0);
    }

    #[test]
    fn test_maintenance_and_log_rows() {
        let reports = populated();
        let maintenance = reports.maintenance(None).unwrap();
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].machine, "HPLC");
        assert_eq!(maintenance[0].total_cost, 12.5);

        let logs = reports.usage_logs(None, None).unwrap();
        assert_eq!(logs.len(), 2);
        let future = Utc::now() + chrono::Duration::days(1);
        assert!(reports.usage_logs(None, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn test_csv_export_quotes_fields() {
        let logs = populated().usage_logs(None, None).unwrap();
        let mut out = Vec::new();
        write_csv(&mut out, &logs).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("date,machine,part_id,amount,unit,responsible,notes\n"));
        assert!(text.contains("\"run, batch 7\""));
    }

    #[test]
    fn test_json_export() {
        let rows = populated().usage().unwrap();
        let mut out = Vec::new();
        write_json(&mut out, &rows).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["status"], "warning");
    }
}
