//! applock_rust — named database application locks behind a fail-safe
//! client protocol.
//!
//! The database's app-lock primitive does the locking. This crate
//! validates lock requests, runs the acquire/release procedures on a
//! caller-owned [`Connection`], translates their status codes, and reports
//! every result as an [`Outcome`] instead of an error.
//!
//! ## Quick Start
//!
//! ```ignore
//! use applock_rust::{AppLock, AppLockClient, InMemoryLockServer, LockMode, LockOwner};
//!
//! let server = InMemoryLockServer::new();
//! let mut conn = server.connect();
//! let client = AppLockClient::new();
//!
//! let outcome = client.set_lock("nightly-report", LockMode::Exclusive, LockOwner::Session, 5, &mut conn);
//! if outcome.is_success() {
//!     // ... do the work ...
//!     client.release_lock("nightly-report", LockOwner::Session, &mut conn);
//! } else {
//!     for message in outcome.messages() {
//!         eprintln!("{}", message);
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
#[cfg(feature = "emitter")]
pub mod events;
pub mod lock;
mod outcome;

pub use config::{ConfigError, LockSettings, NamedLock};
pub use connection::{CallError, Connection, ProcedureCall, SqlValue, TransactionId};
#[cfg(feature = "emitter")]
pub use events::{LockEvent, LockEvents};
pub use lock::{
    AcquireStatus, AppLock, AppLockClient, InMemoryConnection, InMemoryLockServer, LockError,
    LockMode, LockOwner, ReleaseStatus, SessionId, ValidationError,
};
pub use outcome::Outcome;
