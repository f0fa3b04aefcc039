use thiserror::Error;

use crate::connection::CallError;

/// A lock request rejected locally, before any database call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("lock name is empty or consists only of whitespace")]
    EmptyName,
    #[error("lock name is {len} UTF-16 code units long, the limit is {max}")]
    NameTooLong { len: usize, max: usize },
    #[error("lock timeout is {0}, must be 0 or positive")]
    NegativeTimeout(i32),
    #[error("lock owner is Transaction but no transaction is active")]
    NoActiveTransaction,
    #[error("unknown lock mode '{0}'")]
    UnknownMode(String),
    #[error("unknown lock owner '{0}'")]
    UnknownOwner(String),
}

/// How loudly a failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Critical,
}

/// Error type for lock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The request was malformed or inconsistent with the connection state.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Release was attempted on a connection that is not open.
    #[error("the database connection is closed, it must be open in order to release a lock")]
    ConnectionClosed,
    /// The database answered but did not grant the lock.
    #[error("'{procedure}' returned '{status}'")]
    NotGranted {
        procedure: &'static str,
        status: String,
    },
    /// The database answered but did not release the lock.
    #[error("'{procedure}' returned '{status}'")]
    NotReleased {
        procedure: &'static str,
        status: String,
    },
    /// The owner does not currently hold the lock it tried to release.
    #[error("'{procedure}' gave exception 'LockNotHeldError'")]
    NotHeld { procedure: &'static str },
    /// Unexpected failure in the connection or call layer.
    #[error("the error is: '{0}'")]
    Call(#[source] CallError),
}

impl LockError {
    pub fn severity(&self) -> Severity {
        match self {
            LockError::Call(_) => Severity::Critical,
            _ => Severity::Error,
        }
    }
}
