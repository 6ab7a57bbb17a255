//! Project discovery and initialization
//!
//! A labtrack project is any directory containing a `.labtrack/` folder. It
//! holds the project config, the team roster, the short ID index and the
//! SQLite document database.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::core::config::{Config, StoreBackend};
use crate::core::repo::Repository;
use crate::core::store::{DocumentStore, MemoryStore, SqliteStore, StoreError};

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".labtrack";

/// Default database file inside the project directory
pub const DEFAULT_DB_FILE: &str = "labtrack.db";

const CONFIG_TEMPLATE: &str = "\
# labtrack project configuration
# author: Jane Smith

store:
  backend: sqlite
  # path: .labtrack/labtrack.db
  timeout_ms: 5000

monitor:
  interval_secs: 300
";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not inside a labtrack project (no {PROJECT_DIR} directory found from {0})")]
    NotFound(PathBuf),

    #[error("a labtrack project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open the document store: {0}")]
    Store(#[from] StoreError),
}

/// A labtrack project rooted at a directory
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` looking for a `.labtrack` directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            if current.join(PROJECT_DIR).is_dir() {
                debug!(root = %current.display(), "found project");
                return Ok(Self {
                    root: current.to_path_buf(),
                });
            }
            dir = current.parent();
        }
        Err(ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create a new project at `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        let dir = root.join(PROJECT_DIR);
        if dir.exists() {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("config.yaml"), CONFIG_TEMPLATE)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn labtrack_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.labtrack_dir().join("config.yaml")
    }

    pub fn team_path(&self) -> PathBuf {
        self.labtrack_dir().join("team.yaml")
    }

    /// Database location; relative config paths resolve against the project root
    pub fn db_path(&self, config: &Config) -> PathBuf {
        match &config.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root.join(path),
            None => self.labtrack_dir().join(DEFAULT_DB_FILE),
        }
    }

    /// Open the configured document store
    pub fn open_store(&self, config: &Config) -> Result<Arc<dyn DocumentStore>, ProjectError> {
        let timeout = Duration::from_millis(config.store.timeout_ms);
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Sqlite => {
                let path = self.db_path(config);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Arc::new(SqliteStore::open(&path, timeout)?)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::with_timeout(timeout)),
        };
        Ok(store)
    }

    /// Open the configured store wrapped in a repository
    pub fn repository(&self, config: &Config) -> Result<Repository, ProjectError> {
        Ok(Repository::new(self.open_store(config)?))
    }
}
