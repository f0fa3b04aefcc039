//! Lock lifecycle notifications.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use applock_rust::events::{LOCK_ACQUIRED, LOCK_FAILED, LOCK_RELEASED};
use applock_rust::{
    AppLock, AppLockClient, InMemoryLockServer, LockEvent, LockEvents, LockMode, LockOwner,
};

#[test]
fn operations_publish_events() {
    let seen: Arc<Mutex<Vec<LockEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let events = LockEvents::new();
    for name in [LOCK_ACQUIRED, LOCK_RELEASED, LOCK_FAILED] {
        let seen = Arc::clone(&seen);
        events.on(name, move |event| seen.lock().unwrap().push(event));
    }

    let client = AppLockClient::new().with_events(events);
    let server = InMemoryLockServer::new();
    let mut conn = server.connect();

    assert!(client
        .set_lock("R1", LockMode::Exclusive, LockOwner::Session, 0, &mut conn)
        .is_success());
    assert!(client
        .release_lock("R1", LockOwner::Session, &mut conn)
        .is_success());
    assert!(client
        .release_lock("R1", LockOwner::Session, &mut conn)
        .is_failure());

    // EventEmitter is async, give it time
    thread::sleep(Duration::from_millis(100));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);

    let acquired = seen.iter().find(|e| e.event_type() == LOCK_ACQUIRED).unwrap();
    assert_eq!(acquired.name, "R1");
    assert_eq!(acquired.mode, Some(LockMode::Exclusive));

    assert!(seen.iter().any(|e| e.event_type() == LOCK_RELEASED));

    let failed = seen.iter().find(|e| e.event_type() == LOCK_FAILED).unwrap();
    assert_eq!(failed.operation, "release_lock");
    assert!(failed.message.as_deref().unwrap().contains("LockNotHeldError"));
}
