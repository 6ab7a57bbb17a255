//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Global user config (`~/.config/labtrack/config.yaml` or platform equivalent)
//! 3. Project config (`.labtrack/config.yaml`)
//! 4. Environment variables (`LABTRACK_AUTHOR`, `LABTRACK_STORE_TIMEOUT_MS`)

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::project::Project;

/// Default store timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default usage monitor interval in seconds
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 300;

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum StoreBackend {
    #[default]
    Sqlite,
    /// Ephemeral; contents vanish when the process exits
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: Option<PathBuf>,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_MONITOR_INTERVAL_SECS,
        }
    }
}

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub author: Option<String>,
    pub store: StoreConfig,
    pub monitor: MonitorConfig,
}

/// One config file; every key optional so layers can be merged
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    author: Option<String>,
    store: StoreLayer,
    monitor: MonitorLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreLayer {
    backend: Option<StoreBackend>,
    path: Option<PathBuf>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MonitorLayer {
    interval_secs: Option<u64>,
}

impl Config {
    /// Load global, project and environment configuration
    ///
    /// Works outside a project too; only the project layer is skipped.
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();
        if let Some(path) = Self::global_config_path() {
            config.merge_file(&path);
        }
        if let Some(project) = project {
            config.merge_file(&project.config_path());
        }
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Path of the user-wide config file
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "labtrack").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn merge_file(&mut self, path: &Path) {
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };
        match serde_yml::from_str::<ConfigLayer>(&content) {
            Ok(layer) => self.merge(layer),
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable config"),
        }
    }

    fn merge(&mut self, layer: ConfigLayer) {
        if layer.author.is_some() {
            self.author = layer.author;
        }
        if let Some(backend) = layer.store.backend {
            self.store.backend = backend;
        }
        if layer.store.path.is_some() {
            self.store.path = layer.store.path;
        }
        if let Some(timeout) = layer.store.timeout_ms {
            self.store.timeout_ms = timeout;
        }
        if let Some(interval) = layer.monitor.interval_secs {
            self.monitor.interval_secs = interval;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(author) = var("LABTRACK_AUTHOR").filter(|a| !a.trim().is_empty()) {
            self.author = Some(author);
        }
        if let Some(raw) = var("LABTRACK_STORE_TIMEOUT_MS") {
            match raw.trim().parse() {
                Ok(ms) => self.store.timeout_ms = ms,
                Err(_) => warn!(value = %raw, "ignoring invalid LABTRACK_STORE_TIMEOUT_MS"),
            }
        }
    }

    /// Author name for new records
    ///
    /// Falls back to `$USER` / `$USERNAME`, then "unknown".
    pub fn author(&self) -> String {
        self.author
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
