use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::{DirectoryError, UserDirectory, Validation};

/// Fallback display name for users registered without one.
const DEFAULT_DISPLAY_NAME: &str = "Operator";

/// HashMap-backed user directory. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. An empty display name falls back to a generic label.
    pub fn register(
        &self,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), DirectoryError> {
        let mut display_name = display_name.into();
        if display_name.trim().is_empty() {
            display_name = DEFAULT_DISPLAY_NAME.to_string();
        }
        let mut users = self
            .users
            .write()
            .map_err(|_| DirectoryError::LockPoisoned("write"))?;
        users.insert(user_id.into(), display_name);
        Ok(())
    }

    /// Builder form of [`register`](Self::register). A failed registration is
    /// logged and the directory is returned unchanged.
    pub fn with_user(self, user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let user_id = user_id.into();
        if let Err(err) = self.register(user_id.as_str(), display_name) {
            warn!(user_id = %user_id, error = %err, "user not registered");
        }
        self
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn validate(&self, user_id: &str) -> Result<Validation, DirectoryError> {
        let users = self
            .users
            .read()
            .map_err(|_| DirectoryError::LockPoisoned("read"))?;
        Ok(match users.get(user_id) {
            Some(name) => Validation::Found {
                display_name: name.clone(),
            },
            None => Validation::NotFound,
        })
    }
}
