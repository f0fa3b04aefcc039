use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tracing::{debug, error};

use crate::config::LockSettings;
use crate::connection::{CallError, Connection, ProcedureCall, SqlValue};
#[cfg(feature = "emitter")]
use crate::events::{LockEvent, LockEvents};
use crate::Outcome;

use super::{validate, AcquireStatus, LockError, LockMode, LockOwner, ReleaseStatus, Severity};

pub const GET_APP_LOCK: &str = "sp_getapplock";
pub const RELEASE_APP_LOCK: &str = "sp_releaseapplock";

pub(crate) const PARAM_RESOURCE: &str = "@Resource";
pub(crate) const PARAM_LOCK_MODE: &str = "@LockMode";
pub(crate) const PARAM_LOCK_OWNER: &str = "@LockOwner";
pub(crate) const PARAM_LOCK_TIMEOUT: &str = "@LockTimeout";

const RESOURCE_WIDTH: usize = 255;
const TOKEN_WIDTH: usize = 32;

/// Acquire and release named database application locks.
///
/// Both operations return an [`Outcome`] and never panic or propagate
/// errors; failures are logged and reported through the outcome's messages.
pub trait AppLock {
    /// Acquire `name` in `mode`, waiting at most `timeout_secs` seconds.
    ///
    /// A `Transaction` owner requires an active transaction on `conn`.
    /// Opens `conn` if it is closed.
    fn set_lock(
        &self,
        name: &str,
        mode: LockMode,
        owner: LockOwner,
        timeout_secs: i32,
        conn: &mut dyn Connection,
    ) -> Outcome;

    /// Release a lock previously acquired with the same `name` and `owner`.
    ///
    /// `conn` must already be open.
    fn release_lock(&self, name: &str, owner: LockOwner, conn: &mut dyn Connection) -> Outcome;
}

/// [`AppLock`] over the `sp_getapplock` / `sp_releaseapplock` procedures.
pub struct AppLockClient {
    settings: LockSettings,
    #[cfg(feature = "emitter")]
    events: Option<LockEvents>,
}

impl Default for AppLockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AppLockClient {
    pub fn new() -> Self {
        Self::with_settings(LockSettings::default())
    }

    pub fn with_settings(settings: LockSettings) -> Self {
        AppLockClient {
            settings,
            #[cfg(feature = "emitter")]
            events: None,
        }
    }

    /// Publish a [`LockEvent`] after every `set_lock` / `release_lock`.
    #[cfg(feature = "emitter")]
    pub fn with_events(mut self, events: LockEvents) -> Self {
        self.events = Some(events);
        self
    }

    #[cfg(feature = "emitter")]
    pub fn events(&self) -> Option<&LockEvents> {
        self.events.as_ref()
    }

    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// Typed form of [`AppLock::set_lock`]. Nothing is logged.
    pub fn try_set_lock(
        &self,
        name: &str,
        mode: LockMode,
        owner: LockOwner,
        timeout_secs: i32,
        conn: &mut dyn Connection,
    ) -> Result<AcquireStatus, LockError> {
        catch_panics(|| {
            validate(name, owner, timeout_secs, &*conn, &self.settings)?;

            if !conn.is_open() {
                conn.open().map_err(LockError::Call)?;
            }

            let call = ProcedureCall::new(GET_APP_LOCK)
                .param(PARAM_RESOURCE, nvarchar(name, RESOURCE_WIDTH))
                .param(PARAM_LOCK_MODE, varchar(mode.as_token()))
                .param(PARAM_LOCK_OWNER, varchar(owner.as_token()))
                .param(PARAM_LOCK_TIMEOUT, SqlValue::Int(lock_timeout_millis(timeout_secs)))
                .with_timeout(call_timeout(timeout_secs));
            let call = bind_owner(call, owner, &*conn)?;

            let status = AcquireStatus::from_code(conn.execute(&call).map_err(LockError::Call)?);
            if status.is_granted() {
                Ok(status)
            } else {
                Err(LockError::NotGranted {
                    procedure: GET_APP_LOCK,
                    status: status.to_string(),
                })
            }
        })
    }

    /// Typed form of [`AppLock::release_lock`]. Nothing is logged.
    pub fn try_release_lock(
        &self,
        name: &str,
        owner: LockOwner,
        conn: &mut dyn Connection,
    ) -> Result<ReleaseStatus, LockError> {
        catch_panics(|| {
            validate(name, owner, 0, &*conn, &self.settings)?;

            if !conn.is_open() {
                return Err(LockError::ConnectionClosed);
            }

            let call = ProcedureCall::new(RELEASE_APP_LOCK)
                .param(PARAM_RESOURCE, nvarchar(name, RESOURCE_WIDTH))
                .param(PARAM_LOCK_OWNER, varchar(owner.as_token()))
                .with_timeout(Some(self.settings.release_timeout()));
            let call = bind_owner(call, owner, &*conn)?;

            let code = match conn.execute(&call) {
                Ok(code) => code,
                Err(err) if err.is_lock_not_held() => {
                    return Err(LockError::NotHeld {
                        procedure: RELEASE_APP_LOCK,
                    })
                }
                Err(err) => return Err(LockError::Call(err)),
            };

            let status = ReleaseStatus::from_code(code);
            if status.is_released() {
                Ok(status)
            } else {
                Err(LockError::NotReleased {
                    procedure: RELEASE_APP_LOCK,
                    status: status.to_string(),
                })
            }
        })
    }

    fn finish<T: std::fmt::Display>(
        &self,
        operation: &'static str,
        params: String,
        result: Result<T, LockError>,
    ) -> Outcome {
        match result {
            Ok(status) => {
                debug!(operation, params = %params, status = %status, "lock call succeeded");
                Outcome::success()
            }
            Err(err) => {
                let message = format!("Error occurred in '{}{}'. {}.", operation, params, err);
                match err.severity() {
                    Severity::Error => error!(operation, error = %err, "{}", message),
                    Severity::Critical => {
                        error!(operation, severity = "critical", error = %err, "{}", message)
                    }
                }
                Outcome::failure(message)
            }
        }
    }

    #[cfg(feature = "emitter")]
    fn notify(
        &self,
        operation: &str,
        name: &str,
        owner: LockOwner,
        mode: Option<LockMode>,
        outcome: &Outcome,
    ) {
        if let Some(events) = &self.events {
            events.publish(&LockEvent {
                operation: operation.to_string(),
                name: name.to_string(),
                owner,
                mode,
                success: outcome.is_success(),
                message: outcome.messages().first().cloned(),
            });
        }
    }
}

impl AppLock for AppLockClient {
    fn set_lock(
        &self,
        name: &str,
        mode: LockMode,
        owner: LockOwner,
        timeout_secs: i32,
        conn: &mut dyn Connection,
    ) -> Outcome {
        let _span = tracing::debug_span!(
            "set_lock",
            lock_name = name,
            lock_mode = %mode,
            lock_owner = %owner,
            timeout_secs
        )
        .entered();

        let params = format!("('{}', '{}', '{}', '{}')", name, mode, owner, timeout_secs);
        let result = self.try_set_lock(name, mode, owner, timeout_secs, conn);
        let outcome = self.finish("set_lock", params, result);

        #[cfg(feature = "emitter")]
        self.notify("set_lock", name, owner, Some(mode), &outcome);

        outcome
    }

    fn release_lock(&self, name: &str, owner: LockOwner, conn: &mut dyn Connection) -> Outcome {
        let _span =
            tracing::debug_span!("release_lock", lock_name = name, lock_owner = %owner).entered();

        let params = format!("('{}', '{}')", name, owner);
        let result = self.try_release_lock(name, owner, conn);
        let outcome = self.finish("release_lock", params, result);

        #[cfg(feature = "emitter")]
        self.notify("release_lock", name, owner, None, &outcome);

        outcome
    }
}

impl AppLockClient {
    /// Acquire with a mode given as its wire token, rejecting unknown
    /// tokens before touching the database.
    pub fn set_lock_by_token(
        &self,
        name: &str,
        mode: &str,
        owner: LockOwner,
        timeout_secs: i32,
        conn: &mut dyn Connection,
    ) -> Outcome {
        match mode.parse::<LockMode>() {
            Ok(mode) => self.set_lock(name, mode, owner, timeout_secs, conn),
            Err(err) => {
                let params = format!("('{}', '{}', '{}', '{}')", name, mode, owner, timeout_secs);
                self.finish::<AcquireStatus>("set_lock", params, Err(err.into()))
            }
        }
    }
}

fn nvarchar(value: &str, max_len: usize) -> SqlValue {
    SqlValue::NVarChar {
        value: value.to_string(),
        max_len,
    }
}

fn varchar(value: &str) -> SqlValue {
    SqlValue::VarChar {
        value: value.to_string(),
        max_len: TOKEN_WIDTH,
    }
}

/// `@LockTimeout` is in milliseconds.
fn lock_timeout_millis(timeout_secs: i32) -> i32 {
    (i64::from(timeout_secs) * 1000).clamp(0, i64::from(i32::MAX)) as i32
}

/// The lock wait doubles as the call's execution ceiling. Zero means
/// no ceiling; the procedure returns at once with a zero lock wait.
fn call_timeout(timeout_secs: i32) -> Option<Duration> {
    match u64::try_from(timeout_secs) {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

fn bind_owner(
    call: ProcedureCall,
    owner: LockOwner,
    conn: &dyn Connection,
) -> Result<ProcedureCall, LockError> {
    match owner {
        LockOwner::Session => Ok(call),
        LockOwner::Transaction => conn
            .current_transaction()
            .map(|tx| call.in_transaction(tx))
            .ok_or_else(|| super::ValidationError::NoActiveTransaction.into()),
    }
}

fn catch_panics<T>(f: impl FnOnce() -> Result<T, LockError>) -> Result<T, LockError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(LockError::Call(CallError::Panicked(panic_message(&*payload)))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
