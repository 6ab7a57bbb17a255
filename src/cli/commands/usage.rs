//! `labtrack usage` command - record wear-part usage and review the dashboard

use chrono::{Duration, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::mach::part_status_label;
use crate::cli::filters::PartStatusFilter;
use crate::cli::helpers::{format_amount, truncate_str, Session};
use crate::cli::output::{print_list, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::report::{Reports, UsageRow};
use crate::core::team::Action;
use crate::core::usage::UsageEngine;
use crate::entities::machine::PartStatus;
use crate::entities::notification::{Notification, Severity};
use crate::entities::usage_log::UsageLog;

#[derive(Subcommand, Debug)]
pub enum UsageCommands {
    /// Record usage of an installed wear part
    Record(RecordArgs),

    /// Usage dashboard for every installed part
    Status(StatusArgs),

    /// Usage log entries
    Log(LogArgs),
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// Inventory item the part was installed from (INV@N)
    pub item: String,

    /// Amount used
    #[arg(allow_hyphen_values = true)]
    pub amount: f64,

    /// Usage unit; must match the part's unit
    #[arg(long, short = 'u')]
    pub unit: String,

    /// Notes for the usage log
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Filter by wear status
    #[arg(long, short = 's', value_enum, default_value_t = PartStatusFilter::All)]
    pub status: PartStatusFilter,
}

#[derive(clap::Args, Debug)]
pub struct LogArgs {
    /// Only entries for this machine (MACH@N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,

    /// Only entries from the last N days
    #[arg(long)]
    pub days: Option<u32>,
}

pub fn run(cmd: UsageCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        UsageCommands::Record(args) => run_record(args, &mut session, global),
        UsageCommands::Status(args) => run_status(args, &mut session, global),
        UsageCommands::Log(args) => run_log(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

fn run_record(args: RecordArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::RecordUsage)?;
    let machine = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let item = session.resolve(&args.item, EntityPrefix::Inv)?;

    let receipt = UsageEngine::new(session.repo.clone()).record_usage(
        &machine,
        &item,
        args.amount,
        &args.unit,
        &session.user,
        args.notes.as_deref(),
    )?;
    session.alias(&receipt.part.id);

    match global.output {
        OutputFormat::Id => println!("{}", receipt.log.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            #[derive(serde::Serialize)]
            struct Recorded<'a> {
                log: &'a UsageLog,
                current_usage: f64,
                max_usage: f64,
                percentage: f64,
                status: PartStatus,
                alert: Option<&'a Notification>,
            }
            print_value(
                global.output,
                &Recorded {
                    log: &receipt.log,
                    current_usage: receipt.part.current_usage,
                    max_usage: receipt.part.max_usage,
                    percentage: receipt.percentage,
                    status: receipt.status,
                    alert: receipt.alert.as_ref(),
                },
            )?;
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} {} {}: {} / {} {} ({:.1}%) {}",
                    style("✓").green(),
                    style(&receipt.part.name).yellow(),
                    session.short_ids.display(&receipt.part.id),
                    format_amount(receipt.part.current_usage),
                    format_amount(receipt.part.max_usage),
                    receipt.part.usage_unit,
                    receipt.percentage,
                    part_status_label(receipt.status)
                );
            }
            if let Some(alert) = &receipt.alert {
                let marker = match alert.severity {
                    Severity::High => style("!").red().bold(),
                    _ => style("!").yellow().bold(),
                };
                eprintln!("{} {}", marker, alert.message);
            }
        }
    }
    Ok(())
}

pub(crate) fn print_dashboard(rows: &[UsageRow], global: &GlobalOpts) -> Result<()> {
    print_list(
        global.output,
        rows,
        &["MACHINE", "PART", "USAGE", "MAX", "UNIT", "%", "STATUS"],
        |r| {
            vec![
                truncate_str(&r.machine, 24),
                truncate_str(&r.part, 24),
                format_amount(r.accumulated),
                format_amount(r.max_usage),
                r.unit.clone(),
                format!("{:.1}", r.percentage),
                part_status_label(r.status),
            ]
        },
        |r| r.part_id.clone(),
    )
}

fn run_status(args: StatusArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let rows: Vec<UsageRow> = Reports::new(session.repo.clone())
        .usage()?
        .into_iter()
        .filter(|r| args.status.matches(r.status))
        .collect();
    if rows.is_empty() {
        if !global.quiet {
            println!("No tracked parts.");
        }
        return Ok(());
    }
    print_dashboard(&rows, global)?;

    let due = rows.iter().filter(|r| r.requires_maintenance).count();
    if due > 0 && !global.quiet && matches!(global.output, OutputFormat::Auto | OutputFormat::Table) {
        println!("{} part(s) require maintenance", style(due).red().bold());
    }
    Ok(())
}

fn run_log(args: LogArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let machine = args
        .machine
        .as_deref()
        .map(|m| session.resolve(m, EntityPrefix::Mach))
        .transpose()?;
    let since = args.days.map(|d| Utc::now() - Duration::days(i64::from(d)));
    let logs = Reports::new(session.repo.clone()).usage_logs(machine.as_ref(), since)?;

    if logs.is_empty() {
        if !global.quiet {
            println!("No usage recorded.");
        }
        return Ok(());
    }
    print_list(
        global.output,
        &logs,
        &["DATE", "MACHINE", "AMOUNT", "UNIT", "BY", "NOTES"],
        |l| {
            vec![
                l.date.format("%Y-%m-%d %H:%M").to_string(),
                truncate_str(&l.machine, 24),
                format_amount(l.amount),
                l.unit.clone(),
                l.responsible.clone(),
                truncate_str(&l.notes, 30),
            ]
        },
        |l| l.part_id.clone(),
    )
}
