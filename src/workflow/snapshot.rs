//! SessionSnapshot - the serializable form of a whole scanning session.
//!
//! Snapshots let a host park a session (browser storage, a cookie, a row in a
//! table) and resume it later without re-scanning. Three encodings are offered:
//! JSON for humans, bitcode bytes for compact storage, and a base64 token of
//! those bytes for text-only carriers.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Operator, ScanEvent, ScanMode, StagedRecord};
use crate::staging::StagingError;

use super::{Notice, WorkflowState};

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot json error: {0}")]
    Json(String),
    #[error("snapshot binary error: {0}")]
    Binary(String),
    #[error("snapshot token error: {0}")]
    Token(String),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Staging(#[from] StagingError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u16,
    pub operator: Option<Operator>,
    pub mode: ScanMode,
    pub state: WorkflowState,
    /// Oldest first.
    pub staged: Vec<StagedRecord>,
    pub next_record_id: u64,
    pub notice: Option<Notice>,
    pub last_event: Option<ScanEvent>,
    pub vehicle_tag: Option<String>,
    pub committed_total: u64,
    pub tick: u64,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: SessionSnapshot =
            serde_json::from_str(json).map_err(|e| SnapshotError::Json(e.to_string()))?;
        snapshot.check()?;
        Ok(snapshot)
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Binary(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: SessionSnapshot =
            bitcode::deserialize(bytes).map_err(|e| SnapshotError::Binary(e.to_string()))?;
        snapshot.check()?;
        Ok(snapshot)
    }

    pub fn to_token(&self) -> Result<String, SnapshotError> {
        Ok(STANDARD.encode(self.encode()?))
    }

    pub fn from_token(token: &str) -> Result<Self, SnapshotError> {
        let bytes = STANDARD
            .decode(token)
            .map_err(|e| SnapshotError::Token(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Structural checks a resumed session relies on.
    pub fn check(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        match (&self.operator, self.state.mode()) {
            (None, Some(_)) => {
                return Err(SnapshotError::Inconsistent(
                    "scanning step without an operator".into(),
                ))
            }
            (Some(_), None) => {
                return Err(SnapshotError::Inconsistent(
                    "operator set while awaiting operator".into(),
                ))
            }
            _ => {}
        }
        if let Some(mode) = self.state.mode() {
            if mode != self.mode {
                return Err(SnapshotError::Inconsistent(format!(
                    "state is in {} mode but session mode is {}",
                    mode, self.mode
                )));
            }
        }
        Ok(())
    }
}
