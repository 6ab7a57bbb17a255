//! `labtrack inv` command - inventory management

use clap::Subcommand;
use console::style;
use miette::{bail, Result};

use crate::cli::filters::StockFilter;
use crate::cli::helpers::{confirm, format_amount, success, truncate_str, Session};
use crate::cli::output::{effective_format, print_list, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::inventory::Inventory;
use crate::core::team::Action;
use crate::entities::inventory::{InventoryItem, ItemKind, StockStatus};

#[derive(Subcommand, Debug)]
pub enum InvCommands {
    /// List inventory items
    List(ListArgs),

    /// Create a new inventory item
    New(NewArgs),

    /// Show an item's details
    Show(ShowArgs),

    /// Add or remove stock (use a negative amount to remove)
    Adjust(AdjustArgs),

    /// Archive an item (soft delete)
    Archive(ShowArgs),

    /// Delete an item that is not installed anywhere
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by stock level
    #[arg(long, short = 's', value_enum, default_value_t = StockFilter::All)]
    pub stock: StockFilter,

    /// Only wear parts
    #[arg(long)]
    pub wear: bool,

    /// Include archived items
    #[arg(long)]
    pub archived: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Item kind (consumable, wear-part, general-spare)
    #[arg(long, short = 'k', default_value = "general-spare")]
    pub kind: ItemKind,

    #[arg(long, short = 'c', default_value = "")]
    pub category: String,

    /// Units on hand
    #[arg(long, default_value_t = 0)]
    pub quantity: u32,

    /// Reorder point
    #[arg(long, default_value_t = 0)]
    pub min: u32,

    /// Usage unit (wear parts only), e.g. hours or cycles
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Maximum lifespan in the usage unit (wear parts only)
    #[arg(long, short = 'l')]
    pub lifespan: Option<f64>,

    /// Cost per unit
    #[arg(long)]
    pub cost: Option<f64>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Item ID or short ID (INV@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AdjustArgs {
    /// Item ID or short ID (INV@N)
    pub id: String,

    /// Change in quantity
    #[arg(allow_hyphen_values = true)]
    pub delta: i64,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Item ID or short ID (INV@N)
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: InvCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let result = match cmd {
        InvCommands::List(args) => run_list(args, &mut session, global),
        InvCommands::New(args) => run_new(args, &mut session, global),
        InvCommands::Show(args) => run_show(args, &mut session, global),
        InvCommands::Adjust(args) => run_adjust(args, &mut session, global),
        InvCommands::Archive(args) => run_archive(args, &mut session, global),
        InvCommands::Delete(args) => run_delete(args, &mut session, global),
    };
    session.save_short_ids();
    result
}

fn run_list(args: ListArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let inventory = Inventory::new(session.repo.clone());
    let items: Vec<InventoryItem> = inventory
        .list(args.archived)?
        .into_iter()
        .filter(|i| args.stock.matches(i.stock_status()))
        .filter(|i| !args.wear || i.is_wear_part())
        .collect();

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }
    if items.is_empty() {
        if !global.quiet {
            println!("No inventory items found.");
        }
        return Ok(());
    }

    session.short_ids.ensure_all(items.iter().map(|i| &i.id));
    let short_ids = &session.short_ids;
    print_list(
        global.output,
        &items,
        &["SHORT", "NAME", "KIND", "QTY", "MIN", "STOCK", "LIFESPAN"],
        |i| {
            vec![
                short_ids.display(&i.id),
                truncate_str(&i.name, 30),
                i.kind.to_string(),
                i.quantity.to_string(),
                i.min_quantity.to_string(),
                stock_label(i.stock_status()),
                match (i.max_lifespan, &i.usage_unit) {
                    (Some(max), Some(unit)) => format!("{} {}", format_amount(max), unit),
                    _ => "-".to_string(),
                },
            ]
        },
        |i| i.id.to_string(),
    )
}

fn stock_label(status: StockStatus) -> String {
    match status {
        StockStatus::InStock => style(status.as_str()).green().to_string(),
        StockStatus::LowStock => style(status.as_str()).yellow().to_string(),
        StockStatus::OutOfStock => style(status.as_str()).red().to_string(),
    }
}

fn run_new(args: NewArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageInventory)?;
    let mut item = InventoryItem::new(args.name.trim(), args.kind, session.config.author());
    item.category = args.category;
    item.quantity = args.quantity;
    item.min_quantity = args.min;
    item.usage_unit = args.unit.map(|u| u.trim().to_string());
    item.max_lifespan = args.lifespan;
    item.unit_cost = args.cost;
    item.location = args.location;
    item.description = args.description;

    let item = Inventory::new(session.repo.clone()).create(item)?;
    let alias = session.alias(&item.id);

    match global.output {
        OutputFormat::Id => println!("{}", item.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &item)?,
        _ => success(
            global,
            format!(
                "Created {} {} ({})",
                item.kind,
                style(&alias).cyan(),
                style(&item.name).yellow()
            ),
        ),
    }
    Ok(())
}

fn run_show(args: ShowArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve(&args.id, EntityPrefix::Inv)?;
    let item = Inventory::new(session.repo.clone()).get_inventory_item_by_id(&id)?;
    let alias = session.alias(&item.id);

    match effective_format(global.output, false) {
        OutputFormat::Id => println!("{}", item.id),
        OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &item)?,
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {} ({})", style("ID").bold(), style(&item.id).cyan(), alias);
            println!("{}: {}", style("Name").bold(), style(&item.name).yellow());
            println!("{}: {}", style("Kind").bold(), item.kind);
            if !item.category.is_empty() {
                println!("{}: {}", style("Category").bold(), item.category);
            }
            println!(
                "{}: {} (min {}) {}",
                style("Quantity").bold(),
                item.quantity,
                item.min_quantity,
                stock_label(item.stock_status())
            );
            if let (Some(max), Some(unit)) = (item.max_lifespan, &item.usage_unit) {
                println!("{}: {} {}", style("Lifespan").bold(), format_amount(max), unit);
            }
            if let Some(cost) = item.unit_cost {
                println!("{}: {:.2}", style("Unit cost").bold(), cost);
            }
            if let Some(location) = &item.location {
                println!("{}: {}", style("Location").bold(), location);
            }
            if let Some(description) = &item.description {
                println!();
                println!("{}", description);
            }
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {} | {}: {}{}",
                style("Author").dim(),
                item.author,
                style("Created").dim(),
                item.created.format("%Y-%m-%d %H:%M"),
                if item.archived { " | archived" } else { "" }
            );
        }
    }
    Ok(())
}

fn run_adjust(args: AdjustArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageInventory)?;
    if args.delta == 0 {
        bail!("Adjustment must be non-zero");
    }
    let id = session.resolve(&args.id, EntityPrefix::Inv)?;
    let item = Inventory::new(session.repo.clone()).adjust_quantity(&id, args.delta)?;
    success(
        global,
        format!(
            "{} now has {} unit(s) {}",
            style(&item.name).yellow(),
            item.quantity,
            stock_label(item.stock_status())
        ),
    );
    Ok(())
}

fn run_archive(args: ShowArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageInventory)?;
    let id = session.resolve(&args.id, EntityPrefix::Inv)?;
    let item = Inventory::new(session.repo.clone()).archive(&id)?;
    success(global, format!("Archived {}", style(&item.name).yellow()));
    Ok(())
}

fn run_delete(args: DeleteArgs, session: &mut Session, global: &GlobalOpts) -> Result<()> {
    session.require(Action::ManageInventory)?;
    let id = session.resolve(&args.id, EntityPrefix::Inv)?;
    if !confirm(&format!("Delete {}?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let item = Inventory::new(session.repo.clone()).delete(&id)?;
    success(global, format!("Deleted {}", style(&item.name).yellow()));
    Ok(())
}
