//! CLI command implementations

pub mod incident;
pub mod init;
pub mod inv;
pub mod mach;
pub mod maint;
pub mod notif;
pub mod report;
pub mod team;
pub mod usage;
pub mod watch;
