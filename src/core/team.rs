//! Team roster and role-based permissions
//!
//! The roster lives in `.labtrack/team.yaml`. Without a roster every user may
//! do everything; once one exists, only active members holding a role that
//! grants an action may perform it.

use std::fs;

use serde::{Deserialize, Serialize};

use crate::core::error::EngineError;
use crate::core::project::Project;

/// Role held by a team member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Records usage and reports incidents
    Operator,
    /// Installs parts and performs maintenance
    Technician,
    /// Manages inventory and machines
    Manager,
    /// Everything, including the roster
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Technician => write!(f, "technician"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "operator" => Ok(Role::Operator),
            "technician" | "tech" => Ok(Role::Technician),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!(
                "Invalid role: {}. Use operator, technician, manager, or admin",
                s
            )),
        }
    }
}

/// Something a user may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageInventory,
    ManageMachines,
    InstallParts,
    RecordUsage,
    PerformMaintenance,
    ReportIncident,
    ResolveIncident,
    ManageNotifications,
    ManageTeam,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ManageInventory => "manage inventory",
            Action::ManageMachines => "manage machines",
            Action::InstallParts => "install parts",
            Action::RecordUsage => "record usage",
            Action::PerformMaintenance => "perform maintenance",
            Action::ReportIncident => "report incidents",
            Action::ResolveIncident => "resolve incidents",
            Action::ManageNotifications => "manage notifications",
            Action::ManageTeam => "manage the team",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    /// Whether this role on its own grants `action`
    pub fn grants(&self, action: Action) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => !matches!(action, Action::ManageTeam),
            Role::Technician => matches!(
                action,
                Action::InstallParts
                    | Action::RecordUsage
                    | Action::PerformMaintenance
                    | Action::ReportIncident
                    | Action::ResolveIncident
                    | Action::ManageNotifications
            ),
            Role::Operator => matches!(
                action,
                Action::RecordUsage | Action::ReportIncident | Action::ManageNotifications
            ),
        }
    }
}

/// Capability check supplied to the command layer
pub trait PermissionChecker {
    fn has_permission(&self, user: &str, action: Action) -> bool;

    /// `PermissionDenied` unless `user` may perform `action`
    fn require(&self, user: &str, action: Action) -> Result<(), EngineError> {
        if self.has_permission(user, action) {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied {
                user: user.to_string(),
                action: action.to_string(),
            })
        }
    }
}

/// Grants everything; used when the project has no roster
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn has_permission(&self, _user: &str, _action: Action) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Matched against the acting user
    pub username: String,
    pub roles: Vec<Role>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TeamMember {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn can(&self, action: Action) -> bool {
        self.active && self.roles.iter().any(|r| r.grants(action))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamRoster {
    /// Load the project's roster, if it has one
    pub fn load(project: &Project) -> Option<Self> {
        let content = fs::read_to_string(project.team_path()).ok()?;
        match serde_yml::from_str(&content) {
            Ok(roster) => Some(roster),
            Err(e) => {
                tracing::warn!(error = %e, "team.yaml could not be parsed");
                None
            }
        }
    }

    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let yaml = serde_yml::to_string(self).map_err(std::io::Error::other)?;
        fs::write(project.team_path(), yaml)
    }

    pub fn default_template() -> &'static str {
        "\
# labtrack team roster
# Roles: operator, technician, manager, admin
members:
  - name: Lab Admin
    email: admin@example.com
    username: admin
    roles: [admin]
    active: true
"
    }

    /// Look up a member by username (case-insensitive)
    pub fn find_member(&self, username: &str) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.username.eq_ignore_ascii_case(username))
    }

    pub fn add_member(&mut self, member: TeamMember) {
        self.members.push(member);
    }

    /// Returns `false` if no such member exists
    pub fn remove_member(&mut self, username: &str) -> bool {
        let before = self.members.len();
        self.members
            .retain(|m| !m.username.eq_ignore_ascii_case(username));
        self.members.len() != before
    }

    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.active)
    }

    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &TeamMember> {
        self.active_members().filter(move |m| m.roles.contains(&role))
    }
}

impl PermissionChecker for TeamRoster {
    fn has_permission(&self, user: &str, action: Action) -> bool {
        self.find_member(user).is_some_and(|m| m.can(action))
    }
}
