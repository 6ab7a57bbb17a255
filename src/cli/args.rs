//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::incident::IncidentCommands;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::inv::InvCommands;
use crate::cli::commands::mach::MachCommands;
use crate::cli::commands::maint::MaintCommands;
use crate::cli::commands::notif::NotifCommands;
use crate::cli::commands::report::ReportCommands;
use crate::cli::commands::team::TeamCommands;
use crate::cli::commands::usage::UsageCommands;
use crate::cli::commands::watch::WatchArgs;

#[derive(Parser, Debug)]
#[command(name = "labtrack")]
#[command(about = "Laboratory equipment, inventory and wear-part tracking")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long = "format", short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Acting user (defaults to config author, then $USER)
    #[arg(long, global = true, env = "LABTRACK_USER")]
    pub user: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table for lists, details for single records
    Auto,
    Table,
    Csv,
    Json,
    Yaml,
    /// Full IDs only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a labtrack project in the current directory
    Init(InitArgs),

    /// Inventory items, consumables and wear parts
    #[command(subcommand)]
    Inv(InvCommands),

    /// Machines and their installed wear parts
    #[command(subcommand)]
    Mach(MachCommands),

    /// Record and review wear-part usage
    #[command(subcommand)]
    Usage(UsageCommands),

    /// Maintenance records, resets and part replacement
    #[command(subcommand)]
    Maint(MaintCommands),

    /// Notifications
    #[command(subcommand)]
    Notif(NotifCommands),

    /// Incident reports
    #[command(subcommand)]
    Incident(IncidentCommands),

    /// Team roster
    #[command(subcommand)]
    Team(TeamCommands),

    /// Export reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Periodically print the usage dashboard
    Watch(WatchArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}
