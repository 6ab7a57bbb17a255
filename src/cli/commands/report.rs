//! `labtrack report` command - export usage, maintenance and usage-log data
//!
//! Reports default to CSV. `--format json` writes a JSON array, and the
//! table/yaml formats are available when printing to the terminal.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{format_amount, success, truncate_str, Session};
use crate::cli::output::print_list;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::report::{self, Reports};

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Current usage of every installed wear part
    Usage(ExportArgs),

    /// Maintenance history with costs
    Maintenance(FilteredExportArgs),

    /// Usage log entries
    Logs(LogExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FilteredExportArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Only this machine (MACH@N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LogExportArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Only this machine (MACH@N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,

    /// Only entries from the last N days
    #[arg(long)]
    pub days: Option<u32>,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let reports = Reports::new(session.repo.clone());
    match cmd {
        ReportCommands::Usage(args) => {
            let rows = reports.usage()?;
            emit(&args, global, &rows, &["MACHINE", "PART", "USAGE", "MAX", "UNIT", "%", "STATUS"], |r| {
                vec![
                    truncate_str(&r.machine, 24),
                    truncate_str(&r.part, 24),
                    format_amount(r.accumulated),
                    format_amount(r.max_usage),
                    r.unit.clone(),
                    format!("{:.1}", r.percentage),
                    r.status.to_string(),
                ]
            })
        }
        ReportCommands::Maintenance(args) => {
            let machine = args
                .machine
                .as_deref()
                .map(|m| session.resolve(m, EntityPrefix::Mach))
                .transpose()?;
            let rows = reports.maintenance(machine.as_ref())?;
            emit(
                &args.export,
                global,
                &rows,
                &["DATE", "MACHINE", "KIND", "STATUS", "PARTS", "LABOR", "TOTAL"],
                |r| {
                    vec![
                        r.date.format("%Y-%m-%d").to_string(),
                        truncate_str(&r.machine, 24),
                        r.kind.to_string(),
                        r.status.to_string(),
                        format!("{:.2}", r.parts_cost),
                        format!("{:.2}", r.labor_cost),
                        format!("{:.2}", r.total_cost),
                    ]
                },
            )
        }
        ReportCommands::Logs(args) => {
            let machine = args
                .machine
                .as_deref()
                .map(|m| session.resolve(m, EntityPrefix::Mach))
                .transpose()?;
            let since = args.days.map(|d| Utc::now() - Duration::days(i64::from(d)));
            let rows = reports.usage_logs(machine.as_ref(), since)?;
            emit(&args.export, global, &rows, &["DATE", "MACHINE", "AMOUNT", "UNIT", "BY"], |r| {
                vec![
                    r.date.format("%Y-%m-%d %H:%M").to_string(),
                    truncate_str(&r.machine, 24),
                    format_amount(r.amount),
                    r.unit.clone(),
                    r.responsible.clone(),
                ]
            })
        }
    }
}

fn emit<R: Serialize>(
    args: &ExportArgs,
    global: &GlobalOpts,
    rows: &[R],
    headers: &[&str],
    cells: impl Fn(&R) -> Vec<String>,
) -> Result<()> {
    let Some(path) = &args.output else {
        let format = match global.output {
            OutputFormat::Auto => OutputFormat::Csv,
            other => other,
        };
        return print_list(format, rows, headers, cells, |_| String::new());
    };

    let writer = BufWriter::new(File::create(path).into_diagnostic()?);
    match global.output {
        OutputFormat::Json => report::write_json(writer, rows),
        _ => report::write_csv(writer, rows),
    }
    .into_diagnostic()?;
    success(global, format!("Wrote {} row(s) to {}", rows.len(), path.display()));
    Ok(())
}
