//! DuplicateCache - latency optimization for persisted-duplicate lookups.
//!
//! The cache never decides correctness: the persistent store's uniqueness
//! constraint does. A cached "not persisted" answer only lives for a bounded
//! number of logical ticks, and the batch committer invalidates the keys it
//! has just written.

mod ttl;

pub use ttl::{TtlDuplicateCache, DEFAULT_CACHE_CAPACITY};

/// Injectable cache of `exists_by_primary_key` answers.
pub trait DuplicateCache: Send {
    /// Cached answer for `key` at logical time `now`, if still valid.
    fn lookup(&mut self, key: &str, now: u64) -> Option<bool>;

    /// Remember the store's answer for `key`, observed at `now`.
    fn record(&mut self, key: &str, persisted: bool, now: u64);

    /// Forget everything known about these keys.
    fn invalidate(&mut self, keys: &[&str]);

    fn clear(&mut self);
}

/// A cache that never remembers anything; every check hits the store.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDuplicateCache;

impl DuplicateCache for NoopDuplicateCache {
    fn lookup(&mut self, _key: &str, _now: u64) -> Option<bool> {
        None
    }

    fn record(&mut self, _key: &str, _persisted: bool, _now: u64) {}

    fn invalidate(&mut self, _keys: &[&str]) {}

    fn clear(&mut self) {}
}
