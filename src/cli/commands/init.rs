//! `labtrack init` command - create a project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::project::Project;
use crate::core::team::TeamRoster;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Also write a team roster template
    #[arg(long)]
    pub team: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().into_diagnostic()?,
    };
    std::fs::create_dir_all(&root).into_diagnostic()?;

    let project = Project::init(&root).into_diagnostic()?;
    let config = Config::load_for(Some(&project));
    // Create the database up front so permissions problems show now
    project.open_store(&config).into_diagnostic()?;

    if args.team {
        std::fs::write(project.team_path(), TeamRoster::default_template()).into_diagnostic()?;
    }

    if !global.quiet {
        println!(
            "{} Initialized labtrack project in {}",
            style("✓").green(),
            style(project.labtrack_dir().display()).cyan()
        );
        println!();
        println!("Next steps:");
        println!("  labtrack inv new --name \"Rotor seal\" --kind wear-part --unit hours --lifespan 500");
        println!("  labtrack mach new --name \"Centrifuge\" --model C-100");
        println!("  labtrack mach install MACH@1 INV@1");
    }
    Ok(())
}
