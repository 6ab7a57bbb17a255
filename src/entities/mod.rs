//! Entity type definitions
//!
//! labtrack stores the following entity types:
//!
//! - [`InventoryItem`] - consumables, wear parts and spares with stock levels
//! - [`Machine`] - laboratory equipment
//! - [`MachinePart`] - a wear part installed on a machine, with usage tracking
//! - [`UsageLog`] - append-only usage events
//! - [`Maintenance`] - scheduled and completed maintenance with consumed parts
//! - [`Notification`] - alerts for usage thresholds and stock levels
//! - [`Incident`] - problems reported against a machine

pub mod incident;
pub mod inventory;
pub mod machine;
pub mod maintenance;
pub mod notification;
pub mod usage_log;

pub use incident::{Incident, IncidentStatus};
pub use inventory::{InventoryItem, ItemKind, StockStatus};
pub use machine::{Machine, MachinePart, MachineStatus, PartStatus};
pub use maintenance::{Maintenance, MaintenanceKind, MaintenancePart, MaintenanceStatus};
pub use notification::{Notification, NotificationKind, Severity};
pub use usage_log::UsageLog;
