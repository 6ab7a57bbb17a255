//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::{PartStatusFilter, StockFilter};
pub use helpers::Session;

use miette::Result;

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Inv(cmd) => commands::inv::run(cmd, &global),
        Commands::Mach(cmd) => commands::mach::run(cmd, &global),
        Commands::Usage(cmd) => commands::usage::run(cmd, &global),
        Commands::Maint(cmd) => commands::maint::run(cmd, &global),
        Commands::Notif(cmd) => commands::notif::run(cmd, &global),
        Commands::Incident(cmd) => commands::incident::run(cmd, &global),
        Commands::Team(cmd) => cmd.run(&global),
        Commands::Report(cmd) => commands::report::run(cmd, &global),
        Commands::Watch(args) => commands::watch::run(args, &global),
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "labtrack", &mut std::io::stdout());
            Ok(())
        }
    }
}
