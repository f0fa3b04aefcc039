//! Faults from the connection layer never escape the client.

use applock_rust::connection::LOCK_NOT_HELD_ERROR;
use applock_rust::lock::RELEASE_APP_LOCK;
use applock_rust::{
    AppLock, AppLockClient, CallError, Connection, LockError, LockMode, LockOwner,
    ProcedureCall, TransactionId,
};

use crate::support::{init_tracing, Reply, ScriptedConnection};

#[test]
fn lock_not_held_is_a_named_reason() {
    init_tracing();
    let client = AppLockClient::new();
    let not_held = CallError::database(LOCK_NOT_HELD_ERROR, "not currently held");

    let mut conn = ScriptedConnection::new().reply(Reply::Fail(not_held.clone()));
    let outcome = client.release_lock("R1", LockOwner::Session, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("'sp_releaseapplock' gave exception 'LockNotHeldError'"));

    let mut conn = ScriptedConnection::new().reply(Reply::Fail(not_held));
    assert_eq!(
        client.try_release_lock("R1", LockOwner::Session, &mut conn),
        Err(LockError::NotHeld {
            procedure: RELEASE_APP_LOCK
        })
    );
}

#[test]
fn other_database_errors_stay_generic() {
    init_tracing();
    let client = AppLockClient::new();
    let mut conn =
        ScriptedConnection::new().reply(Reply::Fail(CallError::database(1222, "lock request time out")));

    let outcome = client.release_lock("R1", LockOwner::Session, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("database error 1222"));
    assert!(!outcome.messages()[0].contains("LockNotHeldError"));
}

#[test]
fn transport_errors_become_failures() {
    init_tracing();
    let client = AppLockClient::new();

    let mut conn =
        ScriptedConnection::new().reply(Reply::Fail(CallError::Transport("connection reset".into())));
    let outcome = client.set_lock("R1", LockMode::Exclusive, LockOwner::Session, 1, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("connection reset"));

    let mut conn = ScriptedConnection::new().reply(Reply::Fail(CallError::Timeout(
        std::time::Duration::from_secs(1),
    )));
    let err = client
        .try_set_lock("R1", LockMode::Exclusive, LockOwner::Session, 1, &mut conn)
        .unwrap_err();
    assert!(matches!(err, LockError::Call(CallError::Timeout(_))));
}

#[test]
fn failing_to_open_is_a_failure() {
    init_tracing();
    let client = AppLockClient::new();
    let mut conn = ScriptedConnection::closed();
    conn.open_error = Some(CallError::Transport("login failed".into()));

    let outcome = client.set_lock("R1", LockMode::Exclusive, LockOwner::Session, 1, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("login failed"));
    assert!(conn.calls.is_empty());
}

#[test]
fn panicking_connections_are_contained() {
    init_tracing();
    let client = AppLockClient::new();

    let mut conn = ScriptedConnection::new().reply(Reply::Panic("driver bug"));
    let outcome = client.set_lock("R1", LockMode::Exclusive, LockOwner::Session, 1, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("driver bug"));

    let mut conn = ScriptedConnection::new().reply(Reply::Panic("driver bug"));
    assert_eq!(
        client.try_release_lock("R1", LockOwner::Session, &mut conn),
        Err(LockError::Call(CallError::Panicked("driver bug".into())))
    );
}

/// Connection whose transaction lookup blows up.
struct BrokenTransactionState;

impl Connection for BrokenTransactionState {
    fn is_open(&self) -> bool {
        true
    }

    fn open(&mut self) -> Result<(), CallError> {
        Ok(())
    }

    fn current_transaction(&self) -> Option<TransactionId> {
        panic!("transaction state unavailable")
    }

    fn execute(&mut self, _call: &ProcedureCall) -> Result<Option<i32>, CallError> {
        Ok(Some(0))
    }
}

#[test]
fn panicking_transaction_lookup_is_contained() {
    init_tracing();
    let client = AppLockClient::new();
    let mut conn = BrokenTransactionState;

    let outcome = client.set_lock("R1", LockMode::Exclusive, LockOwner::Transaction, 1, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("transaction state unavailable"));

    let outcome = client.release_lock("R1", LockOwner::Transaction, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("transaction state unavailable"));

    assert_eq!(
        client.try_release_lock("R1", LockOwner::Transaction, &mut conn),
        Err(LockError::Call(CallError::Panicked(
            "transaction state unavailable".into()
        )))
    );
}
