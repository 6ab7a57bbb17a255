//! Team command - roster management

use clap::{Args, Subcommand};
use console::style;
use miette::{bail, miette, IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, success, Session};
use crate::cli::output::{print_table, print_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::team::{Action, Role, TeamMember, TeamRoster};

/// Team roster management
#[derive(Debug, Subcommand)]
pub enum TeamCommands {
    /// List team members
    List(TeamListArgs),
    /// Show the acting user's roles and permissions
    Whoami,
    /// Initialize team roster template
    Init(TeamInitArgs),
    /// Add a team member
    Add(TeamAddArgs),
    /// Remove a team member
    Remove(TeamRemoveArgs),
}

#[derive(Debug, Args)]
pub struct TeamListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<Role>,
}

#[derive(Debug, Args)]
pub struct TeamInitArgs {
    /// Overwrite existing team.yaml
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct TeamAddArgs {
    /// Member's full name
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub email: String,

    /// Username (matched against --user / LABTRACK_USER)
    #[arg(long)]
    pub username: String,

    /// Roles (comma-separated: operator,technician,manager,admin)
    #[arg(long, value_delimiter = ',', required = true)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Args)]
pub struct TeamRemoveArgs {
    /// Username to remove
    pub username: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const ALL_ACTIONS: [Action; 9] = [
    Action::ManageInventory,
    Action::ManageMachines,
    Action::InstallParts,
    Action::RecordUsage,
    Action::PerformMaintenance,
    Action::ReportIncident,
    Action::ResolveIncident,
    Action::ManageNotifications,
    Action::ManageTeam,
];

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TeamCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        match self {
            TeamCommands::List(args) => args.run(global),
            TeamCommands::Whoami => run_whoami(global),
            TeamCommands::Init(args) => args.run(global),
            TeamCommands::Add(args) => args.run(global),
            TeamCommands::Remove(args) => args.run(global),
        }
    }
}

impl TeamListArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let Some(roster) = TeamRoster::load(&session.project) else {
            bail!("No team roster found. Run 'labtrack team init' to create one.");
        };

        let members: Vec<&TeamMember> = match self.role {
            Some(role) => roster.members_with_role(role).collect(),
            None => roster.active_members().collect(),
        };
        if members.is_empty() {
            println!("No team members found.");
            return Ok(());
        }

        match global.output {
            OutputFormat::Json | OutputFormat::Yaml => print_value(global.output, &members)?,
            OutputFormat::Id => {
                for member in members {
                    println!("{}", member.username);
                }
            }
            _ => print_table(
                &["NAME", "EMAIL", "USERNAME", "ROLES"],
                members
                    .iter()
                    .map(|m| {
                        vec![
                            m.name.clone(),
                            m.email.clone(),
                            m.username.clone(),
                            join_roles(&m.roles),
                        ]
                    })
                    .collect(),
            ),
        }
        Ok(())
    }
}

fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let Some(roster) = TeamRoster::load(&session.project) else {
        println!(
            "{} (no team roster; every action is allowed)",
            style(&session.user).cyan()
        );
        return Ok(());
    };

    let Some(member) = roster.find_member(&session.user) else {
        bail!(
            "You ({}) are not in the team roster.\n\
             Add yourself with: labtrack team add --name \"{}\" --username {} --roles operator",
            session.user,
            session.user,
            session.user
        );
    };

    println!("Name:     {}", member.name);
    if !member.email.is_empty() {
        println!("Email:    {}", member.email);
    }
    println!("Username: {}", member.username);
    println!("Roles:    {}", join_roles(&member.roles));
    println!("Active:   {}", member.active);
    println!();
    println!("Permissions:");
    for action in ALL_ACTIONS {
        let mark = if member.can(action) {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {}", mark, action);
    }
    Ok(())
}

impl TeamInitArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        let team_path = session.project.team_path();
        if team_path.exists() && !self.force {
            bail!(
                "Team roster already exists at {}\n\
                 Use --force to overwrite.",
                team_path.display()
            );
        }
        if team_path.exists() {
            session.require(Action::ManageTeam)?;
        }

        std::fs::write(&team_path, TeamRoster::default_template()).into_diagnostic()?;
        success(global, format!("Created team roster at {}", team_path.display()));
        if !global.quiet {
            println!("\nEdit this file to add your team members, or use:");
            println!("  labtrack team add --name \"Jane Smith\" --username jsmith --roles technician");
        }
        Ok(())
    }
}

impl TeamAddArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        session.require(Action::ManageTeam)?;
        let mut roster = TeamRoster::load(&session.project).unwrap_or_default();

        if roster.find_member(&self.username).is_some() {
            bail!(
                "User '{}' already exists in the team roster.\n\
                 Use 'labtrack team remove {}' first to update.",
                self.username,
                self.username
            );
        }

        roster.add_member(TeamMember {
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            roles: self.roles.clone(),
            active: true,
        });
        roster.save(&session.project).into_diagnostic()?;

        success(
            global,
            format!(
                "Added {} ({}) as {}",
                self.name,
                self.username,
                join_roles(&self.roles)
            ),
        );
        Ok(())
    }
}

impl TeamRemoveArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = Session::open(global)?;
        session.require(Action::ManageTeam)?;
        let mut roster =
            TeamRoster::load(&session.project).ok_or_else(|| miette!("No team roster found."))?;

        let name = roster
            .find_member(&self.username)
            .map(|m| m.name.clone())
            .ok_or_else(|| miette!("User '{}' not found in team roster.", self.username))?;

        if !confirm(
            &format!("Remove {} ({}) from team roster?", name, self.username),
            self.yes,
        )? {
            println!("Aborted.");
            return Ok(());
        }

        if !roster.remove_member(&self.username) {
            bail!("Failed to remove user.");
        }
        roster.save(&session.project).into_diagnostic()?;
        success(global, format!("Removed {} ({}) from team roster", name, self.username));
        Ok(())
    }
}
