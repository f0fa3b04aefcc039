use std::time::Duration;

use thiserror::Error;

/// Driver error number raised by `sp_releaseapplock` when the caller's
/// owner does not currently hold the named lock.
pub const LOCK_NOT_HELD_ERROR: i32 = 1223;

/// Error surfaced by a [`Connection`](super::Connection) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The database rejected the call with a numbered error.
    #[error("database error {number}: {message}")]
    Database { number: i32, message: String },
    /// The call was issued on a connection that is not open.
    #[error("connection is not open")]
    ConnectionClosed,
    /// The call exceeded its execution-timeout ceiling.
    #[error("call exceeded its execution timeout of {0:?}")]
    Timeout(Duration),
    /// Network or driver failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The connection implementation panicked mid-call.
    #[error("connection panicked: {0}")]
    Panicked(String),
}

impl CallError {
    pub fn database(number: i32, message: impl Into<String>) -> Self {
        CallError::Database {
            number,
            message: message.into(),
        }
    }

    /// Structured error number, when the database supplied one.
    pub fn number(&self) -> Option<i32> {
        match self {
            CallError::Database { number, .. } => Some(*number),
            _ => None,
        }
    }

    pub fn is_lock_not_held(&self) -> bool {
        self.number() == Some(LOCK_NOT_HELD_ERROR)
    }
}
