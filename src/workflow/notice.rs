use serde::{Deserialize, Serialize};

use crate::duplicate::DuplicateScope;
use crate::error::{PairingConflict, WorkflowError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    OperatorNotFound,
    DuplicatePrimaryKey { scope: DuplicateScope },
    InvalidPairing { reason: PairingConflict },
    LookupFailure { timeout: bool },
    CommitFailure { timeout: bool },
    OperatorRequired,
    StagingConflict,
}

/// A sticky, operator-visible condition attached to the session.
///
/// Stays until a later scan is processed successfully or the operator
/// dismisses it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub severity: Severity,
    /// The raw value that was rejected, when there is one.
    pub value: Option<String>,
    pub message: String,
    /// Logical tick at which the notice was raised.
    pub raised_at: u64,
}

impl Notice {
    pub fn from_error(error: &WorkflowError, raised_at: u64) -> Self {
        let (kind, value) = match error {
            WorkflowError::OperatorNotFound { value } => {
                (NoticeKind::OperatorNotFound, Some(value.clone()))
            }
            WorkflowError::DuplicatePrimaryKey { key, scope } => (
                NoticeKind::DuplicatePrimaryKey { scope: *scope },
                Some(key.clone()),
            ),
            WorkflowError::InvalidPairing { value, reason } => (
                NoticeKind::InvalidPairing { reason: *reason },
                Some(value.clone()),
            ),
            WorkflowError::LookupFailure(err) => (
                NoticeKind::LookupFailure {
                    timeout: err.is_timeout(),
                },
                None,
            ),
            WorkflowError::CommitFailure(err) => (
                NoticeKind::CommitFailure {
                    timeout: err.is_timeout(),
                },
                None,
            ),
            WorkflowError::OperatorRequired => (NoticeKind::OperatorRequired, None),
            WorkflowError::Staging(_) => (NoticeKind::StagingConflict, None),
        };

        let severity = match kind {
            NoticeKind::InvalidPairing { .. } | NoticeKind::OperatorRequired => Severity::Warning,
            _ => Severity::Error,
        };

        Notice {
            kind,
            severity,
            value,
            message: error.to_string(),
            raised_at,
        }
    }
}
