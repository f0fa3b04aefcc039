//! Tunables for the lock client and preconfigured named locks.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::Connection;
use crate::lock::{AppLock, LockMode, LockOwner};
use crate::Outcome;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid lock settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid lock settings: {0}")]
    Invalid(String),
}

/// Client-wide settings. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Execution-timeout ceiling for release calls, in seconds.
    pub release_timeout_secs: u64,
    /// Longest lock name accepted, in characters. Matches the width of
    /// the procedure's resource parameter.
    pub max_resource_len: usize,
}

impl Default for LockSettings {
    fn default() -> Self {
        LockSettings {
            release_timeout_secs: 5,
            max_resource_len: 255,
        }
    }
}

impl LockSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: LockSettings = serde_json::from_str(json)?;
        if settings.release_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "release_timeout_secs must be positive".into(),
            ));
        }
        if settings.max_resource_len == 0 {
            return Err(ConfigError::Invalid(
                "max_resource_len must be positive".into(),
            ));
        }
        Ok(settings)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_secs(self.release_timeout_secs)
    }
}

/// A lock whose name, mode, owner and timeout are fixed up front, so call
/// sites only supply the connection.
///
/// ```ignore
/// let lock = NamedLock::default(); // "DemoLock", Exclusive, Transaction, 2s
/// let outcome = lock.set(&client, &mut conn);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLock {
    pub name: String,
    pub mode: LockMode,
    pub owner: LockOwner,
    pub timeout_secs: i32,
}

impl Default for NamedLock {
    fn default() -> Self {
        NamedLock {
            name: "DemoLock".into(),
            mode: LockMode::Exclusive,
            owner: LockOwner::Transaction,
            timeout_secs: 2,
        }
    }
}

impl NamedLock {
    pub fn new(name: impl Into<String>, mode: LockMode, owner: LockOwner, timeout_secs: i32) -> Self {
        NamedLock {
            name: name.into(),
            mode,
            owner,
            timeout_secs,
        }
    }

    pub fn set(&self, client: &dyn AppLock, conn: &mut dyn Connection) -> Outcome {
        client.set_lock(&self.name, self.mode, self.owner, self.timeout_secs, conn)
    }

    pub fn release(&self, client: &dyn AppLock, conn: &mut dyn Connection) -> Outcome {
        client.release_lock(&self.name, self.owner, conn)
    }
}
