//! Shared helper functions for CLI commands

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::core::repo::Repository;
use crate::core::shortid::ShortIdIndex;
use crate::core::team::{Action, AllowAll, PermissionChecker, TeamRoster};

/// Everything a command needs to talk to the project
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub repo: Repository,
    pub short_ids: ShortIdIndex,
    /// Acting user
    pub user: String,
    roster: Option<TeamRoster>,
}

impl Session {
    /// Discover the project and open its store
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = Project::discover().into_diagnostic()?;
        let config = Config::load_for(Some(&project));
        let repo = project.repository(&config).into_diagnostic()?;
        let short_ids = ShortIdIndex::load(&project);
        let roster = TeamRoster::load(&project);
        let user = global
            .user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| config.author());
        tracing::debug!(root = %project.root().display(), user = %user, "session opened");
        Ok(Self {
            project,
            config,
            repo,
            short_ids,
            user,
            roster,
        })
    }

    /// Fail with a permission error unless the acting user may perform `action`
    pub fn require(&self, action: Action) -> Result<()> {
        match &self.roster {
            Some(roster) => roster.require(&self.user, action)?,
            None => AllowAll.require(&self.user, action)?,
        }
        Ok(())
    }

    /// Resolve a short ID (`MACH@1`) or full ID of the expected kind
    pub fn resolve(&self, reference: &str, prefix: EntityPrefix) -> Result<EntityId> {
        let full = self
            .short_ids
            .resolve(reference)
            .ok_or_else(|| miette!("Unknown short ID '{}'", reference))?;
        EntityId::parse_with_prefix(&full, prefix)
            .map_err(|e| miette!("'{}' is not a valid {} ID: {}", reference, prefix, e))
    }

    /// Short alias for an ID, assigning one if needed
    pub fn alias(&mut self, id: &EntityId) -> String {
        self.short_ids.add(id)
    }

    /// Persist short IDs assigned during this command
    pub fn save_short_ids(&self) {
        if let Err(e) = self.short_ids.save(&self.project) {
            tracing::warn!(error = %e, "could not save short ID index");
        }
    }
}

/// Ask for confirmation unless `yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print a success line unless running quietly
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a usage amount without trailing zeros
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
