//! `labtrack maint` command - maintenance, usage resets and part replacement

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use console::style;
use miette::{miette, Result};

use crate::cli::helpers::{format_amount, success, truncate_str, Session};
use crate::cli::output::{effective_format, print_list, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::maintenance::{MaintenanceWorkflow, ScheduleRequest};
use crate::core::report::Reports;
use crate::core::team::Action;
use crate::core::usage::{ConsumedPart, MaintenanceDetails, UsageEngine};
use crate::entities::maintenance::{Maintenance, MaintenanceKind};

#[derive(Subcommand, Debug)]
pub enum MaintCommands {
    /// Reset a part's usage after servicing it
    Reset(ResetArgs),

    /// Replace an installed part with a unit from inventory
    Replace(ReplaceArgs),

    /// Schedule a maintenance
    Schedule(ScheduleArgs),

    /// Complete a scheduled maintenance
    Complete(CompleteArgs),

    /// Set resolution notes on a maintenance
    Resolve(ResolveArgs),

    /// List maintenance records
    List(ListArgs),

    /// Show a maintenance record
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// Inventory item the part was installed from (INV@N)
    pub item: String,

    /// A new unit of the part was fitted from stock
    #[arg(long)]
    pub replaced: bool,

    /// Other inventory consumed, as ITEM[:QTY] (repeatable)
    #[arg(long = "consume", short = 'c')]
    pub consumed: Vec<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, default_value_t = 0.0)]
    pub labor_cost: f64,

    #[arg(long)]
    pub resolution: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReplaceArgs {
    /// Installed part ID or short ID (PART@N)
    pub part: String,

    /// Replacement wear-part item (INV@N)
    pub item: String,
}

#[derive(clap::Args, Debug)]
pub struct ScheduleArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// What needs doing
    #[arg(long, short = 'd')]
    pub description: String,

    /// Kind of maintenance
    #[arg(long, short = 'k', default_value = "preventive")]
    pub kind: MaintenanceKind,

    /// Planned date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, default_value_t = 0.0)]
    pub labor_cost: f64,
}

#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// Maintenance ID or short ID (MNT@N)
    pub id: String,

    /// Inventory consumed, as ITEM[:QTY] (repeatable)
    #[arg(long = "consume", short = 'c')]
    pub consumed: Vec<String>,

    #[arg(long)]
    pub resolution: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Maintenance ID or short ID (MNT@N)
    pub id: String,

    /// Resolution notes (empty clears them)
    pub text: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only records for this machine (MACH@N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Maintenance ID or short ID (MNT@N)
    pub id: String,
}

pub fn run(cmd: MaintCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        MaintCommands::Reset(args) => run_reset(args, &mut session, global),
        MaintCommands::Replace(args) => run_replace(args, &mut session, global),
        MaintCommands::Schedule(args) => run_schedule(args, &mut session, global),
        MaintCommands::Complete(args) => run_complete(args, &mut session, global),
        MaintCommands::Resolve(args) => run_resolve(args, &mut session, global),
        MaintCommands::List(args) => run_list(args, &mut session, global),
        MaintCommands::Show(args) => run_show(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

/// Parse `ITEM[:QTY]` references into consumed parts
fn parse_consumed(session: &Session, entries: &[String]) -> Result<Vec<ConsumedPart>> {
    entries
        .iter()
        .map(|entry| {
            let (reference, quantity) = match entry.rsplit_once(':') {
                Some((reference, qty)) => (
                    reference,
                    qty.trim()
                        .parse::<u32>()
                        .map_err(|_| miette!("Invalid quantity in '{}'", entry))?,
                ),
                None => (entry.as_str(), 1),
            };
            Ok(ConsumedPart {
                item: session.resolve(reference, EntityPrefix::Inv)?,
                quantity,
            })
        })
        .collect()
}

fn report_created(session: &mut Session, global: &GlobalOpts, record: &Maintenance, verb: &str) -> Result<()> {
    let alias = session.alias(&record.id);
    match global.output {
        OutputFormat::Id => println!("{}", record.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, record)?,
        _ => success(
            global,
            format!(
                "{} {} ({}, total cost {:.2})",
                verb,
                style(&alias).cyan(),
                record.kind,
                record.total_cost()
            ),
        ),
    }
    Ok(())
}

fn run_reset(args: ResetArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::PerformMaintenance)?;
    let machine = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let item = session.resolve(&args.item, EntityPrefix::Inv)?;
    let consumed = parse_consumed(session, &args.consumed)?;

    let record = UsageEngine::new(session.repo.clone()).register_maintenance_reset(
        &machine,
        &item,
        MaintenanceDetails {
            performed_by: session.user.clone(),
            description: args.description,
            replaced: args.replaced,
            consumed,
            labor_cost: args.labor_cost,
            resolution: args.resolution,
        },
    )?;
    report_created(session, global, &record, "Recorded")
}

fn run_replace(args: ReplaceArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::PerformMaintenance)?;
    let part_id = session.resolve(&args.part, EntityPrefix::Part)?;
    let item = session.resolve(&args.item, EntityPrefix::Inv)?;
    let part = UsageEngine::new(session.repo.clone()).replace_part(&part_id, &item, &session.user)?;
    match global.output {
        OutputFormat::Id => println!("{}", part.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &part)?,
        _ => success(
            global,
            format!(
                "Replaced {} with {} (life {} {})",
                args.part,
                style(&part.name).yellow(),
                format_amount(part.max_usage),
                part.usage_unit
            ),
        ),
    }
    Ok(())
}

fn run_schedule(args: ScheduleArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::PerformMaintenance)?;
    let machine = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let scheduled_for: Option<DateTime<Utc>> = args
        .date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());

    let record = MaintenanceWorkflow::new(session.repo.clone()).schedule(ScheduleRequest {
        machine,
        kind: args.kind,
        description: args.description,
        scheduled_for,
        labor_cost: args.labor_cost,
        author: session.user.clone(),
    })?;
    report_created(session, global, &record, "Scheduled")
}

fn run_complete(args: CompleteArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::PerformMaintenance)?;
    let id = session.resolve(&args.id, EntityPrefix::Mnt)?;
    let consumed = parse_consumed(session, &args.consumed)?;
    let record = MaintenanceWorkflow::new(session.repo.clone()).complete(
        &id,
        &session.user,
        &consumed,
        args.resolution,
    )?;
    report_created(session, global, &record, "Completed")
}

fn run_resolve(args: ResolveArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::PerformMaintenance)?;
    let id = session.resolve(&args.id, EntityPrefix::Mnt)?;
    MaintenanceWorkflow::new(session.repo.clone()).set_resolution(&id, &args.text)?;
    success(global, format!("Updated resolution of {}", args.id));
    Ok(())
}

fn run_list(args: ListArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let machine = args
        .machine
        .as_deref()
        .map(|m| session.resolve(m, EntityPrefix::Mach))
        .transpose()?;
    let rows = Reports::new(session.repo.clone()).maintenance(machine.as_ref())?;
    if rows.is_empty() {
        if !global.quiet {
            println!("No maintenance records found.");
        }
        return Ok(());
    }

    let ids: Vec<EntityId> = rows.iter().filter_map(|r| r.id.parse().ok()).collect();
    session.short_ids.ensure_all(ids.iter());
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &rows,
        &["SHORT", "DATE", "MACHINE", "KIND", "STATUS", "BY", "COST", "DESCRIPTION"],
        |r| {
            vec![
                r.id
                    .parse::<EntityId>()
                    .map(|id| short_ids.display(&id))
                    .unwrap_or_else(|_| r.id.clone()),
                r.date.format("%Y-%m-%d").to_string(),
                truncate_str(&r.machine, 20),
                r.kind.to_string(),
                r.status.to_string(),
                r.performed_by.clone(),
                format!("{:.2}", r.total_cost),
                truncate_str(&r.description, 36),
            ]
        },
        |r| r.id.clone(),
    )
}

fn run_show(args: ShowArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve(&args.id, EntityPrefix::Mnt)?;
    let record = MaintenanceWorkflow::new(session.repo.clone()).get(&id)?;
    let alias = session.alias(&record.id);

    match effective_format(global.output, false) {
        OutputFormat::Id => println!("{}", record.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &record)?,
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {} ({})", style("ID").bold(), style(&record.id).cyan(), alias);
            println!("{}: {}", style("Machine").bold(), session.short_ids.display(&record.machine));
            println!("{}: {}", style("Kind").bold(), record.kind);
            println!("{}: {}", style("Status").bold(), record.status);
            println!("{}: {}", style("Description").bold(), record.description);
            if let Some(by) = &record.performed_by {
                println!("{}: {}", style("Performed by").bold(), by);
            }
            if !record.parts.is_empty() {
                println!();
                println!("{} ({}):", style("Parts").bold(), record.parts.len());
                for part in &record.parts {
                    println!("  • {} × {} @ {:.2}", part.quantity, part.name, part.unit_cost);
                }
            }
            println!(
                "{}: {:.2} (labor {:.2})",
                style("Total cost").bold(),
                record.total_cost(),
                record.labor_cost
            );
            if let Some(resolution) = &record.resolution {
                println!("{}: {}", style("Resolution").bold(), resolution);
            }
            println!("{}", style("─".repeat(60)).dim());
        }
    }
    Ok(())
}
