//! `labtrack notif` command - review and acknowledge notifications

use clap::Subcommand;
use console::style;
use miette::{bail, Result};

use crate::cli::helpers::{success, truncate_str, Session};
use crate::cli::output::print_list;
use crate::cli::GlobalOpts;
use crate::core::alerts::{NotificationFilter, Notifier};
use crate::core::identity::EntityPrefix;
use crate::core::team::Action;
use crate::entities::notification::Severity;

#[derive(Subcommand, Debug)]
pub enum NotifCommands {
    /// List notifications, newest first
    List(ListArgs),

    /// Mark notifications as read
    Read(ReadArgs),

    /// Delete a notification
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only unread notifications
    #[arg(long, short = 'u')]
    pub unread: bool,

    /// Minimum severity (low, medium, high)
    #[arg(long, short = 's')]
    pub severity: Option<Severity>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReadArgs {
    /// Notification ID or short ID (NTF@N)
    #[arg(required_unless_present = "all")]
    pub id: Option<String>,

    /// Mark every notification as read
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Notification ID or short ID (NTF@N)
    pub id: String,
}

pub fn run(cmd: NotifCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        NotifCommands::List(args) => run_list(args, &mut session, global),
        NotifCommands::Read(args) => run_read(args, &mut session, global),
        NotifCommands::Delete(args) => run_delete(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::High => style(severity.as_str()).red().bold().to_string(),
        Severity::Medium => style(severity.as_str()).yellow().to_string(),
        Severity::Low => style(severity.as_str()).dim().to_string(),
    }
}

fn run_list(args: ListArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let notifications = Notifier::new(session.repo.clone()).list(NotificationFilter {
        unread_only: args.unread,
        min_severity: args.severity,
    })?;

    if args.count {
        println!("{}", notifications.len());
        return Ok(());
    }
    if notifications.is_empty() {
        if !global.quiet {
            println!("No notifications.");
        }
        return Ok(());
    }

    session.short_ids.ensure_all(notifications.iter().map(|n| &n.id));
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &notifications,
        &["SHORT", "DATE", "SEVERITY", "TYPE", "", "MESSAGE"],
        |n| {
            vec![
                short_ids.display(&n.id),
                n.created.format("%Y-%m-%d %H:%M").to_string(),
                severity_label(n.severity),
                n.kind.to_string(),
                if n.read { String::new() } else { "●".to_string() },
                truncate_str(&n.message, 60),
            ]
        },
        |n| n.id.to_string(),
    )
}

fn run_read(args: ReadArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageNotifications)?;
    let notifier = Notifier::new(session.repo.clone());
    if args.all {
        let count = notifier.mark_all_read()?;
        success(global, format!("Marked {} notification(s) as read", count));
        return Ok(());
    }

    let Some(reference) = args.id else {
        bail!("Specify a notification ID or --all");
    };
    let id = session.resolve(&reference, EntityPrefix::Ntf)?;
    if !notifier.mark_read(&id)? {
        bail!("Notification not found: {}", reference);
    }
    success(global, format!("Marked {} as read", reference));
    Ok(())
}

fn run_delete(args: DeleteArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageNotifications)?;
    let id = session.resolve(&args.id, EntityPrefix::Ntf)?;
    if !Notifier::new(session.repo.clone()).delete(&id)? {
        bail!("Notification not found: {}", args.id);
    }
    success(global, format!("Deleted {}", args.id));
    Ok(())
}
