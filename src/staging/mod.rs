//! StagingBuffer - pending records of the current session, the unit of a batch.

use std::collections::HashMap;

use thiserror::Error;

use crate::record::{RecordId, StagedRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StagingError {
    #[error("primary key {key} is already staged as {existing}")]
    DuplicatePrimaryKey { key: String, existing: RecordId },
    #[error("record id {0} is already staged")]
    DuplicateId(RecordId),
    #[error("record ids are exhausted")]
    IdExhausted,
}

/// Ordered collection of staged records keyed by id.
///
/// Record ids are allocated by the buffer and increase monotonically, which
/// gives insertion order without a separate list; `remove` stays O(1).
#[derive(Clone, Debug, Default)]
pub struct StagingBuffer {
    records: HashMap<RecordId, StagedRecord>,
    by_primary: HashMap<String, RecordId>,
    next_id: u64,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a buffer from records, e.g. when resuming a session.
    /// Ids allocated afterwards continue past `next_id` and every restored id.
    pub fn restore(
        records: impl IntoIterator<Item = StagedRecord>,
        next_id: u64,
    ) -> Result<Self, StagingError> {
        let mut buffer = StagingBuffer {
            next_id,
            ..Self::default()
        };
        for record in records {
            let after = record
                .id
                .value()
                .checked_add(1)
                .ok_or(StagingError::IdExhausted)?;
            buffer.next_id = buffer.next_id.max(after);
            buffer.add(record)?;
        }
        Ok(buffer)
    }

    /// Hand out a fresh record id. Ids are never reused, even after removal.
    pub fn allocate_id(&mut self) -> Result<RecordId, StagingError> {
        let id = RecordId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(StagingError::IdExhausted)?;
        Ok(id)
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn add(&mut self, record: StagedRecord) -> Result<(), StagingError> {
        if let Some(existing) = self.by_primary.get(&record.primary_key) {
            return Err(StagingError::DuplicatePrimaryKey {
                key: record.primary_key.clone(),
                existing: *existing,
            });
        }
        if self.records.contains_key(&record.id) {
            return Err(StagingError::DuplicateId(record.id));
        }
        self.by_primary.insert(record.primary_key.clone(), record.id);
        self.records.insert(record.id, record);
        Ok(())
    }

    pub fn remove(&mut self, id: RecordId) -> Option<StagedRecord> {
        let record = self.records.remove(&id)?;
        self.by_primary.remove(&record.primary_key);
        Some(record)
    }

    /// Newest first, the order an operator sees them in.
    pub fn list(&self) -> Vec<&StagedRecord> {
        let mut records: Vec<&StagedRecord> = self.records.values().collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }

    /// Oldest first, the order rows are written in.
    pub fn records_oldest_first(&self) -> Vec<StagedRecord> {
        let mut records: Vec<StagedRecord> = self.records.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn get(&self, id: RecordId) -> Option<&StagedRecord> {
        self.records.get(&id)
    }

    pub fn contains_primary(&self, key: &str) -> bool {
        self.by_primary.contains_key(key)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &str> {
        self.by_primary.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_primary.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
