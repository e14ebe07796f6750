// ABOUTME: Error types for deployment orchestration.
// ABOUTME: Covers droplet validation, missing web processes, storage and audit failures.

use crate::audit::AuditError;
use crate::store::StoreError;

/// Errors that can occur while creating or pruning deployments.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The target droplet is missing or belongs to another app.
    #[error("Unable to assign current droplet. Ensure the droplet exists and belongs to this app.")]
    SetCurrentDroplet,

    /// The app has no process of the web type to roll out.
    #[error("app {0} has no web process to deploy")]
    NoWebProcess(String),

    /// The revision collaborator refused to create a revision.
    #[error("failed to create revision: {0}")]
    Revision(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Caller input was rejected; nothing was written. Not retryable.
    Validation,
    /// The store failed mid-operation; nothing was written.
    Transaction,
    /// A collaborator (revision or audit) failed; nothing was written.
    Collaborator,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::SetCurrentDroplet | DeployError::NoWebProcess(_) => {
                DeployErrorKind::Validation
            }
            DeployError::Store(StoreError::AppNotFound(_)) => DeployErrorKind::Validation,
            DeployError::Store(_) => DeployErrorKind::Transaction,
            DeployError::Revision(_) | DeployError::Audit(_) => DeployErrorKind::Collaborator,
        }
    }
}
