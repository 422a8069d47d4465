use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Duplicate-check behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DedupConfig {
    /// Default: `1`
    pub version: u32,

    /// Upper bound on one store lookup. A slower store degrades the check
    /// to "not a duplicate" instead of holding up the message.
    ///
    /// Default: `250`
    pub lookup_timeout_ms: u64,

    /// How far back a prior submission still counts as the original.
    ///
    /// Default: `86_400` (24 hours)
    pub window_secs: u64,

    /// When `false` the store is never consulted.
    ///
    /// Default: `true`
    pub enabled: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("dedup.version must be >= 1")]
    InvalidVersion,
    #[error("lookup_timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("window_secs must be greater than zero")]
    ZeroWindow,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            version: 1,
            lookup_timeout_ms: 250,
            window_secs: 86_400,
            enabled: true,
        }
    }
}

impl DedupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.window_secs == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
