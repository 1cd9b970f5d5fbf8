//! UserDirectory - validates operator identifiers at login.

mod in_memory;

use thiserror::Error;

pub use in_memory::InMemoryUserDirectory;

/// Result of looking up a user id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Found { display_name: String },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("directory lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("directory lookup timed out")]
    Timeout,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DirectoryError::Timeout)
    }
}

/// External collaborator that knows which operators exist.
pub trait UserDirectory: Send + Sync {
    fn validate(&self, user_id: &str) -> Result<Validation, DirectoryError>;

    /// Startup reachability check. Directories that can be unreachable should override this.
    fn ping(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}

impl<D: UserDirectory + ?Sized> UserDirectory for std::sync::Arc<D> {
    fn validate(&self, user_id: &str) -> Result<Validation, DirectoryError> {
        (**self).validate(user_id)
    }

    fn ping(&self) -> Result<(), DirectoryError> {
        (**self).ping()
    }
}
