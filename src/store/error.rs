use thiserror::Error;

/// Errors raised by a [`PersistentStore`](super::PersistentStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The storage-level uniqueness constraint rejected the batch.
    #[error("primary key {key} already committed")]
    UniqueViolation { key: String },
    #[error("store operation {operation} timed out")]
    Timeout { operation: &'static str },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }
}
