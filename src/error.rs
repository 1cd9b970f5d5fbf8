use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commit::CommitError;
use crate::config::ConfigError;
use crate::directory::DirectoryError;
use crate::duplicate::DuplicateScope;
use crate::staging::StagingError;
use crate::store::StoreError;
use crate::workflow::SnapshotError;

/// What a rejected scan collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingConflict {
    /// The scan equals the operator's own id.
    Operator,
    /// The scan equals the locked lot key.
    LockedKey,
    /// The scan equals the first half of the pair in progress.
    PendingPrimary,
    /// A typed secondary differs from the locked lot key.
    NotLockedKey,
}

impl fmt::Display for PairingConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingConflict::Operator => f.write_str("matches the operator id"),
            PairingConflict::LockedKey => f.write_str("matches the locked key"),
            PairingConflict::PendingPrimary => f.write_str("matches the pending primary"),
            PairingConflict::NotLockedKey => f.write_str("is not the locked key"),
        }
    }
}

/// A failed call to an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl LookupError {
    pub fn is_timeout(&self) -> bool {
        match self {
            LookupError::Store(err) => err.is_timeout(),
            LookupError::Directory(err) => err.is_timeout(),
        }
    }
}

/// Every recoverable condition the workflow reports to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("operator {value} not found")]
    OperatorNotFound { value: String },
    #[error("primary key {key} is already {scope}")]
    DuplicatePrimaryKey { key: String, scope: DuplicateScope },
    #[error("scan {value} {reason}")]
    InvalidPairing {
        value: String,
        reason: PairingConflict,
    },
    #[error("lookup failed: {0}")]
    LookupFailure(#[from] LookupError),
    #[error("commit failed: {0}")]
    CommitFailure(#[from] CommitError),
    #[error("no operator is signed in")]
    OperatorRequired,
    #[error("staging conflict: {0}")]
    Staging(StagingError),
}

impl From<StagingError> for WorkflowError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::DuplicatePrimaryKey { key, .. } => WorkflowError::DuplicatePrimaryKey {
                key,
                scope: DuplicateScope::Staged,
            },
            other => WorkflowError::Staging(other),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        WorkflowError::LookupFailure(LookupError::Store(err))
    }
}

impl From<DirectoryError> for WorkflowError {
    fn from(err: DirectoryError) -> Self {
        WorkflowError::LookupFailure(LookupError::Directory(err))
    }
}

/// Conditions that prevent a workflow from being entered at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("persistent store unreachable: {0}")]
    Store(#[from] StoreError),
    #[error("user directory unreachable: {0}")]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
