//! Error taxonomy shared by the inventory, machine, usage and maintenance services

use miette::Diagnostic;
use thiserror::Error;

use crate::core::store::StoreError;

/// Errors surfaced by labtrack operations
///
/// Only [`EngineError::TransientStore`] is worth retrying; every other variant
/// describes a request that will fail the same way again.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    #[diagnostic(code(labtrack::validation))]
    Validation(String),

    #[error("{kind} not found: {id}")]
    #[diagnostic(code(labtrack::not_found))]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} was modified concurrently")]
    #[diagnostic(
        code(labtrack::conflict),
        help("Reload the record and retry the operation")
    )]
    Conflict { kind: String, id: String },

    #[error("Insufficient stock for '{item}': {available} available, {requested} requested")]
    #[diagnostic(code(labtrack::insufficient_stock))]
    InsufficientStock {
        item: String,
        available: u32,
        requested: u32,
    },

    #[error("'{replacement}' is not compatible with part '{part}': {reason}")]
    #[diagnostic(code(labtrack::incompatible_part))]
    IncompatiblePart {
        part: String,
        replacement: String,
        reason: String,
    },

    #[error("Document store unavailable: {0}")]
    #[diagnostic(
        code(labtrack::transient_store),
        help("The store did not answer in time; the operation was not applied and may be retried")
    )]
    TransientStore(String),

    #[error("Document store error: {0}")]
    #[diagnostic(code(labtrack::storage))]
    Storage(String),

    #[error("{user} is not allowed to {action}")]
    #[diagnostic(
        code(labtrack::permission_denied),
        help("Ask an admin to grant the role in .labtrack/team.yaml")
    )]
    PermissionDenied { user: String, action: String },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the operation (with backoff)
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::TransientStore(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { collection, id, .. } => EngineError::Conflict {
                kind: collection.to_string(),
                id,
            },
            StoreError::Timeout { .. } => EngineError::TransientStore(err.to_string()),
            StoreError::Backend(_) | StoreError::Corrupt { .. } => {
                EngineError::Storage(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Collection;
    use std::time::Duration;

    #[test]
    fn test_only_timeouts_are_transient() {
        let timeout: EngineError = StoreError::Timeout {
            operation: "commit",
            timeout: Duration::from_secs(1),
        }
        .into();
        assert!(timeout.is_transient());

        let conflict: EngineError = StoreError::Conflict {
            collection: Collection::Parts,
            id: "PART-1".into(),
            expected: Some(1),
            found: Some(2),
        }
        .into();
        assert!(matches!(conflict, EngineError::Conflict { .. }));
        assert!(!conflict.is_transient());

        assert!(!EngineError::validation("bad").is_transient());
        assert!(!EngineError::not_found("machine", "MACH-1").is_transient());
    }

    #[test]
    fn test_messages() {
        let err = EngineError::InsufficientStock {
            item: "Rotor seal".into(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Rotor seal': 0 available, 1 requested"
        );
        assert_eq!(
            EngineError::not_found("machine", "MACH-1").to_string(),
            "machine not found: MACH-1"
        );
    }
}
