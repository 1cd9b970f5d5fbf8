use std::collections::HashMap;

use super::DuplicateCache;

/// Entries kept before the cache starts making room.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Clone, Copy, Debug)]
struct Entry {
    persisted: bool,
    recorded_at: u64,
}

/// HashMap-backed cache with a time-to-live measured in logical ticks.
///
/// Positive answers never expire (committed rows are immutable); negative
/// answers expire `ttl` ticks after they were recorded. A `ttl` of zero
/// disables negative caching.
///
/// The map holds at most `capacity` keys. When full, expired negative
/// answers are purged first, then the oldest entry is evicted.
#[derive(Clone, Debug)]
pub struct TtlDuplicateCache {
    ttl: u64,
    capacity: usize,
    entries: HashMap<String, Entry>,
}

impl TtlDuplicateCache {
    pub fn new(ttl: u64) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(ttl: u64, capacity: usize) -> Self {
        TtlDuplicateCache {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &Entry, now: u64) -> bool {
        entry.persisted || now.saturating_sub(entry.recorded_at) < self.ttl
    }

    fn make_room(&mut self, now: u64) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.persisted || now.saturating_sub(entry.recorded_at) < ttl);
        if self.entries.len() < self.capacity {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.recorded_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl DuplicateCache for TtlDuplicateCache {
    fn lookup(&mut self, key: &str, now: u64) -> Option<bool> {
        let entry = *self.entries.get(key)?;
        if self.is_fresh(&entry, now) {
            Some(entry.persisted)
        } else {
            self.entries.remove(key);
            None
        }
    }

    fn record(&mut self, key: &str, persisted: bool, now: u64) {
        if !persisted && self.ttl == 0 {
            return;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(key) {
            self.make_room(now);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                persisted,
                recorded_at: now,
            },
        );
    }

    fn invalidate(&mut self, keys: &[&str]) {
        for key in keys {
            self.entries.remove(*key);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
