//! `labtrack incident` command - incident reports

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{success, truncate_str, Session};
use crate::cli::output::{effective_format, print_list, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::incidents::Incidents;
use crate::core::team::Action;
use crate::entities::incident::IncidentStatus;
use crate::entities::notification::Severity;

#[derive(Subcommand, Debug)]
pub enum IncidentCommands {
    /// Report an incident against a machine
    Report(ReportArgs),

    /// Resolve an open incident
    Resolve(ResolveArgs),

    /// List incidents
    List(ListArgs),

    /// Show an incident
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// Short summary
    #[arg(long, short = 't')]
    pub title: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Severity (low, medium, high)
    #[arg(long, short = 's', default_value = "medium")]
    pub severity: Severity,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Incident ID or short ID (INC@N)
    pub id: String,

    /// How it was resolved
    #[arg(long, short = 'r', default_value = "")]
    pub resolution: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only open incidents
    #[arg(long)]
    pub open: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Incident ID or short ID (INC@N)
    pub id: String,
}

pub fn run(cmd: IncidentCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        IncidentCommands::Report(args) => run_report(args, &mut session, global),
        IncidentCommands::Resolve(args) => run_resolve(args, &mut session, global),
        IncidentCommands::List(args) => run_list(args, &mut session, global),
        IncidentCommands::Show(args) => run_show(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

fn run_report(args: ReportArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ReportIncident)?;
    let machine = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let incident = Incidents::new(session.repo.clone()).report(
        &machine,
        &args.title,
        args.description.as_deref(),
        args.severity,
        &session.user,
    )?;
    let alias = session.alias(&incident.id);
    match global.output {
        OutputFormat::Id => println!("{}", incident.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &incident)?,
        _ => success(
            global,
            format!(
                "Reported {} ({} severity): {}",
                style(&alias).cyan(),
                incident.severity,
                incident.title
            ),
        ),
    }
    Ok(())
}

fn run_resolve(args: ResolveArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ResolveIncident)?;
    let id = session.resolve(&args.id, EntityPrefix::Inc)?;
    let incident = Incidents::new(session.repo.clone()).resolve(&id, &args.resolution)?;
    success(global, format!("Resolved {} ({})", args.id, incident.title));
    Ok(())
}

fn run_list(args: ListArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let incidents = Incidents::new(session.repo.clone()).list(args.open)?;
    if incidents.is_empty() {
        if !global.quiet {
            println!("No incidents found.");
        }
        return Ok(());
    }

    session.short_ids.ensure_all(incidents.iter().map(|i| &i.id));
    session.short_ids.ensure_all(incidents.iter().map(|i| &i.machine));
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &incidents,
        &["SHORT", "DATE", "MACHINE", "SEVERITY", "STATUS", "TITLE"],
        |i| {
            vec![
                short_ids.display(&i.id),
                i.created.format("%Y-%m-%d").to_string(),
                short_ids.display(&i.machine),
                i.severity.to_string(),
                match i.status {
                    IncidentStatus::Open => style("open").yellow().to_string(),
                    IncidentStatus::Resolved => style("resolved").green().to_string(),
                },
                truncate_str(&i.title, 40),
            ]
        },
        |i| i.id.to_string(),
    )
}

fn run_show(args: ShowArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve(&args.id, EntityPrefix::Inc)?;
    let incident = Incidents::new(session.repo.clone()).get(&id)?;
    let alias = session.alias(&incident.id);

    match effective_format(global.output, false) {
        OutputFormat::Id => println!("{}", incident.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &incident)?,
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {} ({})", style("ID").bold(), style(&incident.id).cyan(), alias);
            println!("{}: {}", style("Title").bold(), style(&incident.title).yellow());
            println!("{}: {}", style("Machine").bold(), session.short_ids.display(&incident.machine));
            println!("{}: {}", style("Severity").bold(), incident.severity);
            println!("{}: {}", style("Status").bold(), incident.status);
            if let Some(description) = &incident.description {
                println!();
                println!("{}", description);
            }
            if let Some(resolution) = &incident.resolution {
                println!("{}: {}", style("Resolution").bold(), resolution);
            }
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {} | {}: {}",
                style("Reported by").dim(),
                incident.author,
                style("Created").dim(),
                incident.created.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}
