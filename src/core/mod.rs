//! Core module - storage, services and the usage accounting engine

pub mod alerts;
pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod incidents;
pub mod inventory;
pub mod machines;
pub mod maintenance;
pub mod monitor;
pub mod project;
pub mod repo;
pub mod report;
pub mod shortid;
pub mod store;
pub mod team;
pub mod usage;

pub use alerts::{NotificationFilter, Notifier};
pub use config::Config;
pub use entity::Entity;
pub use error::EngineError;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use incidents::Incidents;
pub use inventory::Inventory;
pub use machines::Machines;
pub use maintenance::{MaintenanceWorkflow, ScheduleRequest};
pub use monitor::{MonitorHandle, UsageMonitor};
pub use project::{Project, ProjectError};
pub use repo::{Repository, Transaction, Versioned};
pub use report::{ReportError, Reports};
pub use shortid::ShortIdIndex;
pub use store::{DocumentStore, MemoryStore, SqliteStore, StoreError};
pub use team::{Action, AllowAll, PermissionChecker, Role, TeamMember, TeamRoster};
pub use usage::{ConsumedPart, MaintenanceDetails, UsageEngine, UsageInfo, UsageReceipt};
