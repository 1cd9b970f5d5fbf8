//! BatchCommitter - write the staging buffer as one all-or-nothing batch.
//!
//! ## Example
//!
//! ```ignore
//! let receipt = BatchCommitter::new(&store)
//!     .require_vehicle_tag(true)
//!     .commit(&mut buffer, &mut cache, context)?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::DuplicateCache;
use crate::record::{CommittedRecord, Operator, ScanMode};
use crate::staging::StagingBuffer;
use crate::store::{PersistentStore, StoreError};

static NEXT_BATCH: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("nothing is staged")]
    EmptyBatch,
    #[error("no operator is signed in")]
    NoOperator,
    #[error("lot mode has no locked key")]
    NoLockedReference,
    #[error("staged record {primary_key} has no vehicle tag")]
    MissingVehicleTag { primary_key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommitError::Store(err) if err.is_timeout())
    }
}

/// What the session knows at commit time.
#[derive(Clone, Copy, Debug)]
pub struct CommitContext<'c> {
    pub operator: Option<&'c Operator>,
    pub mode: ScanMode,
    pub locked_reference: Option<&'c str>,
}

/// Outcome of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub batch_id: String,
    pub committed_count: usize,
    pub committed_at: SystemTime,
    pub primary_keys: Vec<String>,
}

/// Borrowing committer over a persistent store.
pub struct BatchCommitter<'a, S: ?Sized> {
    store: &'a S,
    require_vehicle_tag: bool,
}

impl<'a, S: PersistentStore + ?Sized> BatchCommitter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        BatchCommitter {
            store,
            require_vehicle_tag: false,
        }
    }

    pub fn require_vehicle_tag(mut self, require: bool) -> Self {
        self.require_vehicle_tag = require;
        self
    }

    /// Persist every staged record under one batch id and timestamp.
    ///
    /// On success the buffer is cleared and cached lookups for the committed
    /// keys are invalidated. On any failure the buffer is left untouched.
    pub fn commit<C: DuplicateCache + ?Sized>(
        &self,
        buffer: &mut StagingBuffer,
        cache: &mut C,
        context: CommitContext<'_>,
    ) -> Result<CommitReceipt, CommitError> {
        let operator = context.operator.ok_or(CommitError::NoOperator)?;
        if buffer.is_empty() {
            return Err(CommitError::EmptyBatch);
        }
        if context.mode == ScanMode::Lot && context.locked_reference.is_none() {
            return Err(CommitError::NoLockedReference);
        }

        let staged = buffer.records_oldest_first();
        if self.require_vehicle_tag {
            if let Some(untagged) = staged.iter().find(|r| r.vehicle_tag.is_none()) {
                return Err(CommitError::MissingVehicleTag {
                    primary_key: untagged.primary_key.clone(),
                });
            }
        }

        let committed_at = SystemTime::now();
        let batch_id = next_batch_id(committed_at);
        let rows: Vec<CommittedRecord> = staged
            .iter()
            .map(|record| CommittedRecord::from_staged(record, &batch_id, committed_at))
            .collect();

        let inserted = match self.store.insert_batch(&rows) {
            Ok(inserted) => inserted,
            Err(err) => {
                if let StoreError::UniqueViolation { key } = &err {
                    // Another session got there first; stop serving a stale "unique".
                    cache.invalidate(&[key.as_str()]);
                }
                warn!(
                    operator = operator.id(),
                    batch_id = %batch_id,
                    count = rows.len(),
                    error = %err,
                    "batch commit failed"
                );
                return Err(CommitError::Store(err));
            }
        };

        let primary_keys: Vec<String> = rows.into_iter().map(|row| row.primary_key).collect();
        let keys: Vec<&str> = primary_keys.iter().map(String::as_str).collect();
        cache.invalidate(&keys);
        buffer.clear();

        info!(
            operator = operator.id(),
            batch_id = %batch_id,
            count = inserted,
            "batch committed"
        );

        Ok(CommitReceipt {
            batch_id,
            committed_count: inserted,
            committed_at,
            primary_keys,
        })
    }
}

fn next_batch_id(at: SystemTime) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = NEXT_BATCH.fetch_add(1, Ordering::Relaxed);
    format!("batch-{}-{}", millis, seq)
}
