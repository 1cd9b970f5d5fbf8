//! Workflow configuration, loaded from TOML or built in code.
//!
//! ```toml
//! default_mode = "lot"
//! reset_policy = "require_operator"
//! clear_buffer_on_restart = true
//! duplicate_cache_ttl = 30
//! require_vehicle_tag = false
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ScanMode;

/// Upper bound for the duplicate cache window, in logical ticks.
pub const MAX_DUPLICATE_CACHE_TTL: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration parse error: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where the workflow goes after a successful batch commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Keep the operator and restart the selected mode from its first step.
    #[default]
    KeepOperator,
    /// Sign the operator out; the next scan must be an operator id.
    RequireOperator,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub default_mode: ScanMode,
    pub reset_policy: ResetPolicy,
    /// Whether `restart` also drops staged records.
    pub clear_buffer_on_restart: bool,
    /// Logical ticks a "not yet committed" answer may be served from cache.
    pub duplicate_cache_ttl: u64,
    /// Refuse to commit while no vehicle tag is set.
    pub require_vehicle_tag: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            default_mode: ScanMode::Pair,
            reset_policy: ResetPolicy::KeepOperator,
            clear_buffer_on_restart: true,
            duplicate_cache_ttl: 30,
            require_vehicle_tag: false,
        }
    }
}

impl WorkflowConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: WorkflowConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duplicate_cache_ttl > MAX_DUPLICATE_CACHE_TTL {
            return Err(ConfigError::Invalid(format!(
                "duplicate_cache_ttl {} exceeds {}",
                self.duplicate_cache_ttl, MAX_DUPLICATE_CACHE_TTL
            )));
        }
        Ok(())
    }

    pub fn with_default_mode(mut self, mode: ScanMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    pub fn with_duplicate_cache_ttl(mut self, ttl: u64) -> Self {
        self.duplicate_cache_ttl = ttl;
        self
    }

    pub fn with_clear_buffer_on_restart(mut self, clear: bool) -> Self {
        self.clear_buffer_on_restart = clear;
        self
    }

    pub fn with_require_vehicle_tag(mut self, require: bool) -> Self {
        self.require_vehicle_tag = require;
        self
    }
}
