//! Short ID aliases for easier entity selection
//!
//! Every entity listed or created gets a stable alias such as `MACH@1` or
//! `INV@3`, persisted in `.labtrack/shortids.json`. Commands accept either the
//! alias or the full `PREFIX-ULID` ID.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::EntityId;
use crate::core::project::Project;

const INDEX_FILE: &str = "shortids.json";

/// Mapping of `PREFIX@N` aliases to full entity IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// "MACH@1" -> "MACH-01ABC..."
    entries: HashMap<String, String>,
    /// Reverse lookup, rebuilt on load
    #[serde(skip)]
    reverse: HashMap<String, String>,
    /// Next free number per prefix
    next_ids: HashMap<String, u32>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the project's index, or an empty one if missing or unreadable
    pub fn load(project: &Project) -> Self {
        let path = project.labtrack_dir().join(INDEX_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };
        match serde_json::from_str::<ShortIdIndex>(&content) {
            Ok(mut index) => {
                index.reverse = index
                    .entries
                    .iter()
                    .map(|(k, v)| (v.clone(), k.clone()))
                    .collect();
                index
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable short ID index");
                Self::new()
            }
        }
    }

    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.labtrack_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Assign an alias if the ID has none, returning its alias
    pub fn add(&mut self, id: &EntityId) -> String {
        let full = id.to_string();
        if let Some(existing) = self.reverse.get(&full) {
            return existing.clone();
        }
        let prefix = id.prefix().as_str().to_string();
        let next = self.next_ids.entry(prefix.clone()).or_insert(1);
        let alias = format!("{}@{}", prefix, next);
        *next += 1;
        self.entries.insert(alias.clone(), full.clone());
        self.reverse.insert(full, alias.clone());
        alias
    }

    pub fn ensure_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) {
        for id in ids {
            self.add(id);
        }
    }

    /// Resolve `PREFIX@N` (prefix case-insensitive); anything else passes through
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        match reference.split_once('@') {
            Some((prefix, number)) if !prefix.is_empty() => {
                let key = format!("{}@{}", prefix.to_uppercase(), number);
                self.entries.get(&key).cloned()
            }
            _ => Some(reference.to_string()),
        }
    }

    pub fn get_short_id(&self, id: &EntityId) -> Option<&str> {
        self.reverse.get(&id.to_string()).map(String::as_str)
    }

    /// Alias if one exists, otherwise the full ID
    pub fn display(&self, id: &EntityId) -> String {
        self.get_short_id(id)
            .map(String::from)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
