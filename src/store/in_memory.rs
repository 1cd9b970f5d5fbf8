//! InMemoryPersistentStore - Vec-backed committed table with a unique index.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::record::CommittedRecord;

use super::{PersistentStore, StoreError};

#[derive(Default)]
struct Table {
    rows: Vec<CommittedRecord>,
    primary_keys: HashSet<String>,
}

/// In-memory persistent store.
///
/// Clone-friendly via Arc: clones share the same table, so several sessions
/// can commit against one store.
#[derive(Clone, Default)]
pub struct InMemoryPersistentStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryPersistentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All committed rows in insertion order.
    pub fn rows(&self) -> Result<Vec<CommittedRecord>, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(table.rows.clone())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(table.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn get_by_primary_key(&self, key: &str) -> Result<Option<CommittedRecord>, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(table.rows.iter().find(|row| row.primary_key == key).cloned())
    }
}

impl PersistentStore for InMemoryPersistentStore {
    fn exists_by_primary_key(&self, key: &str) -> Result<bool, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(table.primary_keys.contains(key))
    }

    fn insert_batch(&self, records: &[CommittedRecord]) -> Result<usize, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        // Validate the whole batch under the write lock before touching the table.
        let mut incoming = HashSet::with_capacity(records.len());
        for record in records {
            if table.primary_keys.contains(&record.primary_key)
                || !incoming.insert(record.primary_key.as_str())
            {
                return Err(StoreError::UniqueViolation {
                    key: record.primary_key.clone(),
                });
            }
        }

        for record in records {
            table.primary_keys.insert(record.primary_key.clone());
            table.rows.push(record.clone());
        }

        Ok(records.len())
    }
}
