//! PersistentStore - durable table of committed records.
//!
//! The store is the correctness backstop for primary-key uniqueness: two
//! concurrent batches must never both write the same key, whatever the
//! duplicate checker saw beforehand.

mod error;
mod in_memory;

use crate::record::CommittedRecord;

pub use error::StoreError;
pub use in_memory::InMemoryPersistentStore;

/// Abstract durable storage for committed records.
pub trait PersistentStore: Send + Sync {
    /// Whether a record with this primary key has been committed.
    fn exists_by_primary_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Write the whole batch or nothing. Returns the number of rows inserted.
    ///
    /// Implementations must reject the batch with [`StoreError::UniqueViolation`]
    /// if any primary key is already stored or repeated within the batch.
    fn insert_batch(&self, records: &[CommittedRecord]) -> Result<usize, StoreError>;

    /// Startup reachability check. Stores that can be unreachable should override this.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: PersistentStore + ?Sized> PersistentStore for std::sync::Arc<S> {
    fn exists_by_primary_key(&self, key: &str) -> Result<bool, StoreError> {
        (**self).exists_by_primary_key(key)
    }

    fn insert_batch(&self, records: &[CommittedRecord]) -> Result<usize, StoreError> {
        (**self).insert_batch(records)
    }

    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }
}
