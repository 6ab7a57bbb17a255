//! `labtrack watch` command - periodically print the usage dashboard

use std::time::Duration;

use console::style;
use crossbeam_channel::unbounded;
use miette::{bail, Result};

use crate::cli::commands::usage::print_dashboard;
use crate::cli::helpers::Session;
use crate::cli::GlobalOpts;
use crate::core::monitor::UsageMonitor;
use crate::core::report::UsageRow;
use crate::core::usage::UsageEngine;

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Seconds between refreshes (defaults to monitor.interval_secs)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many refreshes
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

pub fn run(args: WatchArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let interval = args.interval.unwrap_or(session.config.monitor.interval_secs);
    if interval == 0 {
        bail!("Interval must be at least one second");
    }
    if args.count == Some(0) {
        return Ok(());
    }

    let (done_tx, done_rx) = unbounded::<()>();
    let printer = global.clone();
    let monitor = UsageMonitor::spawn(
        UsageEngine::new(session.repo.clone()),
        Duration::from_secs(interval),
        move |snapshot| {
            let mut rows: Vec<UsageRow> = snapshot.into_iter().map(UsageRow::from).collect();
            rows.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
            if !printer.quiet {
                println!(
                    "{} {}",
                    style("Usage at").dim(),
                    style(chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).dim()
                );
            }
            if rows.is_empty() {
                println!("No tracked parts.");
            } else if let Err(e) = print_dashboard(&rows, &printer) {
                tracing::warn!(error = %e, "could not print dashboard");
            }
            let _ = done_tx.send(());
        },
    );

    let mut seen = 0;
    while done_rx.recv().is_ok() {
        seen += 1;
        if args.count.is_some_and(|n| seen >= n) {
            break;
        }
    }
    monitor.stop();
    Ok(())
}
