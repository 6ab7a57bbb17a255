//! `labtrack mach` command - machines and installed wear parts

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::filters::PartStatusFilter;
use crate::cli::helpers::{confirm, format_amount, success, truncate_str, Session};
use crate::cli::output::{effective_format, print_list, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::machines::Machines;
use crate::core::team::Action;
use crate::entities::machine::{Machine, MachinePart, MachineStatus, PartStatus};

#[derive(Subcommand, Debug)]
pub enum MachCommands {
    /// List machines
    List(ListArgs),

    /// Register a new machine
    New(NewArgs),

    /// Show a machine with its installed parts
    Show(IdArgs),

    /// Change a machine's operating status
    Status(StatusArgs),

    /// Delete a machine and its installed parts
    Delete(DeleteArgs),

    /// Install a wear part from inventory on a machine
    Install(InstallArgs),

    /// List parts installed on a machine
    Parts(PartsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<MachineStatus>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Machine name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Model designation
    #[arg(long, short = 'm', default_value = "")]
    pub model: String,

    #[arg(long)]
    pub serial: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Inventory record the machine was received as (INV@N)
    #[arg(long)]
    pub item: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Machine ID or short ID (MACH@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Machine ID or short ID (MACH@N)
    pub id: String,

    /// New status (operational, maintenance, inoperative)
    pub status: MachineStatus,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Machine ID or short ID (MACH@N)
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// Wear-part inventory item (INV@N)
    pub item: String,

    /// Do not take the part from stock
    #[arg(long)]
    pub no_stock: bool,
}

#[derive(clap::Args, Debug)]
pub struct PartsArgs {
    /// Machine ID or short ID (MACH@N)
    pub machine: String,

    /// Filter by wear status
    #[arg(long, short = 's', value_enum, default_value_t = PartStatusFilter::All)]
    pub status: PartStatusFilter,
}

pub fn run(cmd: MachCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        MachCommands::List(args) => run_list(args, &mut session, global),
        MachCommands::New(args) => run_new(args, &mut session, global),
        MachCommands::Show(args) => run_show(args, &mut session, global),
        MachCommands::Status(args) => run_status(args, &mut session, global),
        MachCommands::Delete(args) => run_delete(args, &mut session, global),
        MachCommands::Install(args) => run_install(args, &mut session, global),
        MachCommands::Parts(args) => run_parts(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

pub(crate) fn part_status_label(status: PartStatus) -> String {
    match status {
        PartStatus::Normal => style(status.as_str()).green().to_string(),
        PartStatus::Warning => style(status.as_str()).yellow().to_string(),
        PartStatus::Critical => style(status.as_str()).red().bold().to_string(),
    }
}

fn run_list(args: ListArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let machines: Vec<Machine> = Machines::new(session.repo.clone())
        .list()?
        .into_iter()
        .filter(|m| args.status.is_none_or(|s| m.status == s))
        .collect();

    if args.count {
        println!("{}", machines.len());
        return Ok(());
    }
    if machines.is_empty() {
        if !global.quiet {
            println!("No machines found.");
        }
        return Ok(());
    }

    session.short_ids.ensure_all(machines.iter().map(|m| &m.id));
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &machines,
        &["SHORT", "NAME", "MODEL", "STATUS", "LOCATION"],
        |m| {
            vec![
                short_ids.display(&m.id),
                truncate_str(&m.name, 30),
                m.model.clone(),
                m.status.to_string(),
                m.location.clone().unwrap_or_else(|| "-".to_string()),
            ]
        },
        |m| m.id.to_string(),
    )
}

fn run_new(args: NewArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageMachines)?;
    let mut machine = Machine::new(args.name.trim(), args.model.trim(), session.config.author());
    machine.serial_number = args.serial;
    machine.location = args.location;
    if let Some(item) = &args.item {
        machine.inventory_item = Some(session.resolve(item, EntityPrefix::Inv)?);
    }

    let machine = Machines::new(session.repo.clone()).create(machine)?;
    let alias = session.alias(&machine.id);
    match global.output {
        OutputFormat::Id => println!("{}", machine.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &machine)?,
        _ => success(
            global,
            format!("Created machine {} ({})", style(&alias).cyan(), style(&machine.name).yellow()),
        ),
    }
    Ok(())
}

fn run_show(args: IdArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve(&args.id, EntityPrefix::Mach)?;
    let machines = Machines::new(session.repo.clone());
    let machine = machines.get_machine_by_id(&id)?;
    let parts = machines.get_machine_parts(&id)?;
    let alias = session.alias(&machine.id);
    session.short_ids.ensure_all(parts.iter().map(|p| &p.id));

    match effective_format(global.output, false) {
        OutputFormat::Id => println!("{}", machine.id),
        OutputFormat::Json | OutputFormat::Yaml => {
            #[derive(serde::Serialize)]
            struct MachineWithParts<'a> {
                #[serde(flatten)]
                machine: &'a Machine,
                parts: &'a [MachinePart],
            }
            print_value(
                global.output,
                &MachineWithParts {
                    machine: &machine,
                    parts: &parts,
                },
            )?;
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {} ({})", style("ID").bold(), style(&machine.id).cyan(), alias);
            println!("{}: {}", style("Name").bold(), style(&machine.name).yellow());
            if !machine.model.is_empty() {
                println!("{}: {}", style("Model").bold(), machine.model);
            }
            if let Some(serial) = &machine.serial_number {
                println!("{}: {}", style("Serial").bold(), serial);
            }
            if let Some(location) = &machine.location {
                println!("{}: {}", style("Location").bold(), location);
            }
            println!("{}: {}", style("Status").bold(), machine.status);
            println!("{}", style("─".repeat(60)).dim());

            if parts.is_empty() {
                println!("No wear parts installed.");
            } else {
                println!("{} ({}):", style("Wear parts").bold(), parts.len());
                for part in &parts {
                    println!(
                        "  • {} {} {} / {} {} ({:.1}%) {}",
                        session.short_ids.display(&part.id),
                        part.name,
                        format_amount(part.current_usage),
                        format_amount(part.max_usage),
                        part.usage_unit,
                        part.usage_percentage(),
                        part_status_label(part.status())
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_status(args: StatusArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageMachines)?;
    let id = session.resolve(&args.id, EntityPrefix::Mach)?;
    let machine = Machines::new(session.repo.clone()).set_status(&id, args.status)?;
    success(
        global,
        format!("{} is now {}", style(&machine.name).yellow(), machine.status),
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageMachines)?;
    let id = session.resolve(&args.id, EntityPrefix::Mach)?;
    if !confirm(&format!("Delete {} and its installed parts?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let machine = Machines::new(session.repo.clone()).delete(&id)?;
    success(global, format!("Deleted {}", style(&machine.name).yellow()));
    Ok(())
}

fn run_install(args: InstallArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::InstallParts)?;
    let machine = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let item = session.resolve(&args.item, EntityPrefix::Inv)?;
    let part = Machines::new(session.repo.clone()).install_part(
        &machine,
        &item,
        !args.no_stock,
        &session.user,
    )?;
    let alias = session.alias(&part.id);
    match global.output {
        OutputFormat::Id => println!("{}", part.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &part)?,
        _ => success(
            global,
            format!(
                "Installed {} as {} (life {} {})",
                style(&part.name).yellow(),
                style(&alias).cyan(),
                format_amount(part.max_usage),
                part.usage_unit
            ),
        ),
    }
    Ok(())
}

fn run_parts(args: PartsArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve(&args.machine, EntityPrefix::Mach)?;
    let parts: Vec<MachinePart> = Machines::new(session.repo.clone())
        .get_machine_parts(&id)?
        .into_iter()
        .filter(|p| args.status.matches(p.status()))
        .collect();

    if parts.is_empty() {
        if !global.quiet {
            println!("No parts found.");
        }
        return Ok(());
    }

    session.short_ids.ensure_all(parts.iter().map(|p| &p.id));
    session.short_ids.ensure_all(parts.iter().map(|p| &p.item));
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &parts,
        &["SHORT", "PART", "ITEM", "USAGE", "MAX", "UNIT", "%", "STATUS"],
        |p| {
            vec![
                short_ids.display(&p.id),
                truncate_str(&p.name, 30),
                short_ids.display(&p.item),
                format_amount(p.current_usage),
                format_amount(p.max_usage),
                p.usage_unit.clone(),
                format!("{:.1}", p.usage_percentage()),
                part_status_label(p.status()),
            ]
        },
        |p| p.id.to_string(),
    )
}
