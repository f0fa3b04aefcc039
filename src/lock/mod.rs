//! Named application locks held by the database on behalf of a session or
//! a transaction.
//!
//! The database owns the locking algorithm. This module validates
//! requests, issues the acquire/release procedure calls on a
//! caller-supplied [`Connection`](crate::connection::Connection), and maps
//! the returned status codes onto an [`Outcome`](crate::Outcome).

mod client;
mod error;
mod in_memory;
mod mode;
mod status;
mod validation;

pub use client::{AppLock, AppLockClient, GET_APP_LOCK, RELEASE_APP_LOCK};
pub use error::{LockError, Severity, ValidationError};
pub use in_memory::{InMemoryConnection, InMemoryLockServer, SessionId};
pub use mode::{LockMode, LockOwner};
pub use status::{AcquireStatus, ReleaseStatus};
pub use validation::validate;
