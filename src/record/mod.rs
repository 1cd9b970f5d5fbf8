//! Records - the values that flow from scan events to committed rows.
//!
//! A [`ScanEvent`] is consumed by the workflow, a completed pairing becomes a
//! [`StagedRecord`] in the staging buffer, and a successful batch commit turns
//! every staged record into an immutable [`CommittedRecord`].

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A decoded payload delivered by the scan source.
///
/// `sequence` is the logical timestamp of the physical scan. The same event
/// delivered twice carries the same sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub sequence: u64,
    pub value: String,
}

impl ScanEvent {
    pub fn new(sequence: u64, value: impl Into<String>) -> Self {
        ScanEvent {
            sequence,
            value: value.into(),
        }
    }

    /// An empty payload means "no new scan", not a scan of the empty string.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// The authenticated user of a work session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    id: String,
    display_name: String,
}

impl Operator {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Operator {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// How scans are paired into records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// One product code is locked, then many tracking codes are scanned against it.
    Lot,
    /// Every record is a tracking code followed by its own product code.
    #[default]
    Pair,
}

impl ScanMode {
    pub fn label(&self) -> &'static str {
        match self {
            ScanMode::Lot => "lot",
            ScanMode::Pair => "pair",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of a staged record. Allocated monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        RecordId(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec-{}", self.0)
    }
}

/// A completed pairing waiting in the staging buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub id: RecordId,
    pub operator_id: String,
    pub operator_name: String,
    /// Tracking code. Unique across the buffer and the persistent store.
    pub primary_key: String,
    /// Product code.
    pub secondary_key: String,
    #[serde(default)]
    pub vehicle_tag: Option<String>,
    pub mode: ScanMode,
    pub staged_at: SystemTime,
}

/// The durable form of a staged record. Every row of one batch shares
/// `batch_id` and `committed_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedRecord {
    pub batch_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub primary_key: String,
    pub secondary_key: String,
    #[serde(default)]
    pub vehicle_tag: Option<String>,
    pub mode: ScanMode,
    pub staged_at: SystemTime,
    pub committed_at: SystemTime,
}

impl CommittedRecord {
    pub fn from_staged(staged: &StagedRecord, batch_id: &str, committed_at: SystemTime) -> Self {
        CommittedRecord {
            batch_id: batch_id.to_string(),
            operator_id: staged.operator_id.clone(),
            operator_name: staged.operator_name.clone(),
            primary_key: staged.primary_key.clone(),
            secondary_key: staged.secondary_key.clone(),
            vehicle_tag: staged.vehicle_tag.clone(),
            mode: staged.mode,
            staged_at: staged.staged_at,
            committed_at,
        }
    }
}
