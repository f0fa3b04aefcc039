//! Preconfigured locks and client settings.

use applock_rust::{
    AppLock, AppLockClient, InMemoryLockServer, LockMode, LockOwner, LockSettings, NamedLock,
};

#[test]
fn default_named_lock_is_transaction_scoped() {
    let server = InMemoryLockServer::new();
    let client = AppLockClient::new();
    let lock = NamedLock::default();
    let mut conn = server.connect();

    // No transaction yet.
    assert!(lock.set(&client, &mut conn).is_failure());

    conn.begin_transaction().unwrap();
    assert!(lock.set(&client, &mut conn).is_success());
    assert!(server.is_locked("DemoLock"));
    assert!(lock.release(&client, &mut conn).is_success());
    assert!(!server.is_locked("DemoLock"));
    conn.commit().unwrap();
}

#[test]
fn named_lock_contention() {
    let server = InMemoryLockServer::new();
    let client = AppLockClient::new();
    let lock = NamedLock::new("Nightly", LockMode::Exclusive, LockOwner::Session, 0);
    let mut first = server.connect();
    let mut second = server.connect();

    assert!(lock.set(&client, &mut first).is_success());
    assert!(lock.set(&client, &mut second).is_failure());
    assert!(lock.release(&client, &mut first).is_success());
    assert!(lock.set(&client, &mut second).is_success());
}

#[test]
fn named_lock_accepts_any_app_lock() {
    struct AlwaysBusy;

    impl AppLock for AlwaysBusy {
        fn set_lock(
            &self,
            _name: &str,
            _mode: LockMode,
            _owner: LockOwner,
            _timeout_secs: i32,
            _conn: &mut dyn applock_rust::Connection,
        ) -> applock_rust::Outcome {
            applock_rust::Outcome::failure("busy")
        }

        fn release_lock(
            &self,
            _name: &str,
            _owner: LockOwner,
            _conn: &mut dyn applock_rust::Connection,
        ) -> applock_rust::Outcome {
            applock_rust::Outcome::success()
        }
    }

    let server = InMemoryLockServer::new();
    let mut conn = server.connect();
    let lock = NamedLock::default();
    assert_eq!(lock.set(&AlwaysBusy, &mut conn).messages(), ["busy"]);
    assert!(lock.release(&AlwaysBusy, &mut conn).is_success());
}

#[test]
fn settings_limit_name_length() {
    let settings = LockSettings::from_json(r#"{ "max_resource_len": 4 }"#).unwrap();
    let client = AppLockClient::with_settings(settings);
    let server = InMemoryLockServer::new();
    let mut conn = server.connect();

    assert!(client
        .set_lock("abcd", LockMode::Exclusive, LockOwner::Session, 0, &mut conn)
        .is_success());
    let outcome = client.set_lock("abcde", LockMode::Exclusive, LockOwner::Session, 0, &mut conn);
    assert!(outcome.is_failure());
    assert!(outcome.messages()[0].contains("the limit is 4"));
}
