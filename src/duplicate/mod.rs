//! DuplicateChecker - is this primary key already staged or already committed?

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::cache::DuplicateCache;
use crate::staging::StagingBuffer;
use crate::store::{PersistentStore, StoreError};

/// Where a duplicate primary key was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateScope {
    /// Already in the current staging buffer.
    Staged,
    /// Already committed to the persistent store.
    Persisted,
}

impl fmt::Display for DuplicateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateScope::Staged => f.write_str("staged"),
            DuplicateScope::Persisted => f.write_str("persisted"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateCheck {
    Unique,
    Duplicate(DuplicateScope),
}

/// Borrowing checker over a store and a cache, built per check.
pub struct DuplicateChecker<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    cache: &'a mut C,
}

impl<'a, S, C> DuplicateChecker<'a, S, C>
where
    S: PersistentStore + ?Sized,
    C: DuplicateCache + ?Sized,
{
    pub fn new(store: &'a S, cache: &'a mut C) -> Self {
        DuplicateChecker { store, cache }
    }

    /// Staged scope first, then the (possibly cached) persisted scope.
    ///
    /// A failed store lookup is returned as an error, never as `Unique`.
    pub fn check(
        &mut self,
        key: &str,
        buffer: &StagingBuffer,
        now: u64,
    ) -> Result<DuplicateCheck, StoreError> {
        if buffer.contains_primary(key) {
            return Ok(DuplicateCheck::Duplicate(DuplicateScope::Staged));
        }

        let persisted = match self.cache.lookup(key, now) {
            Some(cached) => {
                debug!(primary_key = key, persisted = cached, "duplicate cache hit");
                cached
            }
            None => {
                let persisted = self.store.exists_by_primary_key(key)?;
                self.cache.record(key, persisted, now);
                persisted
            }
        };

        if persisted {
            Ok(DuplicateCheck::Duplicate(DuplicateScope::Persisted))
        } else {
            Ok(DuplicateCheck::Unique)
        }
    }
}
