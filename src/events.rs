use std::sync::Mutex;

use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};

use crate::lock::{LockMode, LockOwner};

pub const LOCK_ACQUIRED: &str = "lock.acquired";
pub const LOCK_RELEASED: &str = "lock.released";
pub const LOCK_FAILED: &str = "lock.failed";

/// Payload delivered to lock event listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEvent {
    pub operation: String,
    pub name: String,
    pub owner: LockOwner,
    /// Set for acquire events only.
    pub mode: Option<LockMode>,
    pub success: bool,
    /// First failure message, if the operation failed.
    pub message: Option<String>,
}

impl LockEvent {
    /// Event name this payload is emitted under.
    pub fn event_type(&self) -> &'static str {
        match (self.success, self.mode) {
            (false, _) => LOCK_FAILED,
            (true, Some(_)) => LOCK_ACQUIRED,
            (true, None) => LOCK_RELEASED,
        }
    }
}

/// In-process notifications for lock operations.
///
/// Listeners run on the emitter's own threads, after the operation has
/// already returned to its caller.
///
/// # Example
///
/// ```ignore
/// let events = LockEvents::new();
/// events.on(LOCK_ACQUIRED, |event| {
///     println!("acquired {}", event.name);
/// });
/// let client = AppLockClient::new().with_events(events);
/// ```
pub struct LockEvents {
    emitter: Mutex<EventEmitter>,
}

impl Default for LockEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl LockEvents {
    pub fn new() -> Self {
        LockEvents {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Register a listener for one of the `lock.*` event names.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(LockEvent) + Send + Sync + 'static,
    {
        let Ok(mut emitter) = self.emitter.lock() else {
            tracing::warn!(event, "lock event emitter poisoned, listener dropped");
            return;
        };
        emitter.on(event, move |payload: String| {
            match serde_json::from_str::<LockEvent>(&payload) {
                Ok(event) => listener(event),
                Err(err) => tracing::warn!(error = %err, "undecodable lock event payload"),
            }
        });
    }

    pub(crate) fn publish(&self, event: &LockEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode lock event");
                return;
            }
        };
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(event.event_type(), payload);
            }
            Err(_) => tracing::warn!("lock event emitter poisoned, event dropped"),
        }
    }
}
