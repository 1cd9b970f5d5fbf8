use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use scanpack_rust::{
    CommittedRecord, DirectoryError, InMemoryPersistentStore, InMemoryUserDirectory,
    PersistentStore, StoreError, UserDirectory, Validation,
};

/// In-memory store that counts lookups and can be switched to time out.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryPersistentStore,
    lookups: Arc<AtomicUsize>,
    timing_out: Arc<AtomicBool>,
    unreachable: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        CountingStore {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn time_out(&self, on: bool) {
        self.timing_out.store(on, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryPersistentStore {
        &self.inner
    }
}

impl PersistentStore for CountingStore {
    fn exists_by_primary_key(&self, key: &str) -> Result<bool, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.timing_out.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout {
                operation: "exists_by_primary_key",
            });
        }
        self.inner.exists_by_primary_key(key)
    }

    fn insert_batch(&self, records: &[CommittedRecord]) -> Result<usize, StoreError> {
        self.inner.insert_batch(records)
    }

    fn ping(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

/// A directory whose backing service is down.
pub struct DownDirectory;

impl UserDirectory for DownDirectory {
    fn validate(&self, _user_id: &str) -> Result<Validation, DirectoryError> {
        Err(DirectoryError::Timeout)
    }

    fn ping(&self) -> Result<(), DirectoryError> {
        Err(DirectoryError::Unavailable("directory offline".into()))
    }
}

pub fn directory() -> InMemoryUserDirectory {
    InMemoryUserDirectory::new().with_user("U1", "Somchai")
}
