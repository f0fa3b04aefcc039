//! The connection context the lock client operates on.
//!
//! The caller owns the connection and any transaction on it. The lock
//! client only inspects its state, opens it on the acquire path, and
//! executes parameterized procedure calls through it. It never closes a
//! connection or ends a transaction.

mod call;
mod error;

pub use call::{Parameter, ProcedureCall, SqlValue, TransactionId};
pub use error::{CallError, LOCK_NOT_HELD_ERROR};

/// Capability over a caller-owned database session.
///
/// Implementations wrap a real driver connection; [`InMemoryConnection`]
/// is the in-process implementation used for tests and local runs.
///
/// [`InMemoryConnection`]: crate::lock::InMemoryConnection
pub trait Connection {
    /// Whether the underlying connection is currently open.
    fn is_open(&self) -> bool;

    /// Open the underlying connection. Only the acquire path calls this.
    fn open(&mut self) -> Result<(), CallError>;

    /// The transaction currently active on this connection, if any.
    fn current_transaction(&self) -> Option<TransactionId>;

    /// Execute a stored-procedure call and return its integer return value.
    ///
    /// `Ok(None)` means the procedure completed without producing a value.
    fn execute(&mut self, call: &ProcedureCall) -> Result<Option<i32>, CallError>;
}
