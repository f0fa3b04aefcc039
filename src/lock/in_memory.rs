use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::connection::{
    CallError, Connection, ProcedureCall, SqlValue, TransactionId, LOCK_NOT_HELD_ERROR,
};

use super::client::{PARAM_LOCK_MODE, PARAM_LOCK_OWNER, PARAM_LOCK_TIMEOUT, PARAM_RESOURCE};
use super::{LockMode, LockOwner, GET_APP_LOCK, RELEASE_APP_LOCK};

const GRANTED: i32 = 0;
const GRANTED_AFTER_WAIT: i32 = 1;
const TIMED_OUT: i32 = -1;
const CANCELED: i32 = -2;
const PARAM_OR_CALL_ERROR: i32 = -999;

const MAX_RESOURCE_LEN: usize = 255;

/// Identifier of a session connected to an [`InMemoryLockServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Session(SessionId),
    Transaction(SessionId, TransactionId),
}

impl Holder {
    fn session(&self) -> SessionId {
        match self {
            Holder::Session(session) | Holder::Transaction(session, _) => *session,
        }
    }
}

#[derive(Debug)]
struct Grant {
    holder: Holder,
    mode: LockMode,
    count: u32,
}

#[derive(Default)]
struct ServerState {
    resources: HashMap<String, Vec<Grant>>,
    waiting: HashSet<SessionId>,
    canceled: HashSet<SessionId>,
}

impl ServerState {
    fn can_grant(&self, resource: &str, holder: Holder, mode: LockMode) -> bool {
        self.resources.get(resource).map_or(true, |grants| {
            grants
                .iter()
                .filter(|g| g.holder != holder)
                .all(|g| g.mode.is_compatible_with(mode))
        })
    }

    fn grant(&mut self, resource: &str, holder: Holder, mode: LockMode) {
        let grants = self.resources.entry(resource.to_string()).or_default();
        match grants
            .iter_mut()
            .find(|g| g.holder == holder && g.mode == mode)
        {
            Some(grant) => grant.count += 1,
            None => grants.push(Grant {
                holder,
                mode,
                count: 1,
            }),
        }
    }

    /// Drop one reference of the most recent grant `holder` has on
    /// `resource`. Returns false when it holds none.
    fn release(&mut self, resource: &str, holder: Holder) -> bool {
        let Some(grants) = self.resources.get_mut(resource) else {
            return false;
        };
        let Some(index) = grants.iter().rposition(|g| g.holder == holder) else {
            return false;
        };
        grants[index].count -= 1;
        if grants[index].count == 0 {
            grants.remove(index);
        }
        if grants.is_empty() {
            self.resources.remove(resource);
        }
        true
    }

    fn release_where(&mut self, matches: impl Fn(&Holder) -> bool) {
        self.resources.retain(|_, grants| {
            grants.retain(|g| !matches(&g.holder));
            !grants.is_empty()
        });
    }
}

struct AcquireRequest {
    resource: String,
    mode: LockMode,
    holder: Holder,
    /// `None` waits indefinitely.
    lock_wait: Option<Duration>,
    ceiling: Option<Duration>,
}

/// In-process stand-in for the database's application-lock manager.
///
/// Speaks the same protocol as `sp_getapplock` / `sp_releaseapplock`:
/// the same status codes, mode compatibility, reference-counted
/// re-acquisition, and error 1223 on releasing a lock that is not held.
/// Transaction-owned grants disappear when the transaction ends, and
/// session-owned grants when the connection closes.
pub struct InMemoryLockServer {
    state: Mutex<ServerState>,
    wake: Condvar,
    next_session: AtomicU64,
}

impl Default for InMemoryLockServer {
    fn default() -> Self {
        InMemoryLockServer {
            state: Mutex::new(ServerState::default()),
            wake: Condvar::new(),
            next_session: AtomicU64::new(1),
        }
    }
}

impl InMemoryLockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a new session against this server.
    pub fn connect(self: &Arc<Self>) -> InMemoryConnection {
        let mut conn = InMemoryConnection::new(Arc::clone(self));
        conn.open = true;
        conn
    }

    /// Whether any owner currently holds `resource`.
    pub fn is_locked(&self, resource: &str) -> bool {
        self.state()
            .map(|state| state.resources.contains_key(resource))
            .unwrap_or(false)
    }

    /// Cancel the acquire `session` is currently waiting on. The waiting
    /// call returns `-2`. Returns false when the session is not waiting.
    pub fn cancel(&self, session: SessionId) -> bool {
        let Ok(mut state) = self.state() else {
            return false;
        };
        if !state.waiting.contains(&session) {
            return false;
        }
        state.canceled.insert(session);
        self.wake.notify_all();
        true
    }

    /// Whether `session` is blocked inside an acquire.
    pub fn is_waiting(&self, session: SessionId) -> bool {
        self.state()
            .map(|state| state.waiting.contains(&session))
            .unwrap_or(false)
    }

    fn next_session_id(&self) -> SessionId {
        SessionId(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    fn state(&self) -> Result<MutexGuard<'_, ServerState>, CallError> {
        self.state
            .lock()
            .map_err(|_| CallError::Transport("lock server state poisoned".into()))
    }

    fn get_app_lock(&self, session: SessionId, call: &ProcedureCall) -> Result<Option<i32>, CallError> {
        match parse_acquire(session, call) {
            Some(request) => self.acquire(session, request).map(Some),
            None => Ok(Some(PARAM_OR_CALL_ERROR)),
        }
    }

    fn acquire(&self, session: SessionId, request: AcquireRequest) -> Result<i32, CallError> {
        let started = Instant::now();
        let lock_deadline = request.lock_wait.map(|wait| started + wait);
        let ceiling_deadline = request.ceiling.map(|ceiling| started + ceiling);
        let mut waited = false;

        let mut state = self.state()?;
        loop {
            if state.canceled.remove(&session) {
                state.waiting.remove(&session);
                return Ok(CANCELED);
            }

            if state.can_grant(&request.resource, request.holder, request.mode) {
                state.grant(&request.resource, request.holder, request.mode);
                state.waiting.remove(&session);
                return Ok(if waited { GRANTED_AFTER_WAIT } else { GRANTED });
            }

            let now = Instant::now();
            if lock_deadline.is_some_and(|deadline| now >= deadline) {
                state.waiting.remove(&session);
                return Ok(TIMED_OUT);
            }
            if ceiling_deadline.is_some_and(|deadline| now >= deadline) {
                state.waiting.remove(&session);
                return Err(CallError::Timeout(request.ceiling.unwrap_or_default()));
            }

            let next_deadline = match (lock_deadline, ceiling_deadline) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };

            trace!(
                session = session.0,
                resource = %request.resource,
                mode = %request.mode,
                "waiting for application lock"
            );
            state.waiting.insert(session);
            waited = true;

            state = match next_deadline {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(now);
                    self.wake
                        .wait_timeout(state, wait)
                        .map_err(|_| CallError::Transport("lock server state poisoned".into()))?
                        .0
                }
                None => self
                    .wake
                    .wait(state)
                    .map_err(|_| CallError::Transport("lock server state poisoned".into()))?,
            };
        }
    }

    fn release_app_lock(
        &self,
        session: SessionId,
        call: &ProcedureCall,
    ) -> Result<Option<i32>, CallError> {
        let Some((resource, holder)) = parse_release(session, call) else {
            return Ok(Some(PARAM_OR_CALL_ERROR));
        };

        let mut state = self.state()?;
        if !state.release(&resource, holder) {
            return Err(CallError::database(
                LOCK_NOT_HELD_ERROR,
                format!(
                    "Cannot release the application lock (Database Principal: 'public', Resource: '{}') because it is not currently held.",
                    resource
                ),
            ));
        }
        self.wake.notify_all();
        Ok(Some(GRANTED))
    }

    fn end_transaction(&self, session: SessionId, transaction: TransactionId) {
        if let Ok(mut state) = self.state() {
            state.release_where(|h| *h == Holder::Transaction(session, transaction));
            self.wake.notify_all();
        }
    }

    fn close_session(&self, session: SessionId) {
        if let Ok(mut state) = self.state() {
            state.release_where(|h| h.session() == session);
            state.waiting.remove(&session);
            state.canceled.remove(&session);
            self.wake.notify_all();
        }
    }
}

fn resource_param(call: &ProcedureCall) -> Option<String> {
    let resource = call.get(PARAM_RESOURCE).and_then(SqlValue::as_str)?;
    if resource.is_empty() || resource.encode_utf16().count() > MAX_RESOURCE_LEN {
        return None;
    }
    Some(resource.to_string())
}

fn holder_param(session: SessionId, call: &ProcedureCall) -> Option<Holder> {
    let owner: LockOwner = call
        .get(PARAM_LOCK_OWNER)
        .and_then(SqlValue::as_str)?
        .parse()
        .ok()?;
    match owner {
        LockOwner::Session => Some(Holder::Session(session)),
        LockOwner::Transaction => call
            .transaction()
            .map(|tx| Holder::Transaction(session, tx)),
    }
}

fn parse_acquire(session: SessionId, call: &ProcedureCall) -> Option<AcquireRequest> {
    let resource = resource_param(call)?;
    let mode: LockMode = call
        .get(PARAM_LOCK_MODE)
        .and_then(SqlValue::as_str)?
        .parse()
        .ok()?;
    let holder = holder_param(session, call)?;
    let millis = call.get(PARAM_LOCK_TIMEOUT).and_then(SqlValue::as_int)?;
    let lock_wait = u64::try_from(millis).ok().map(Duration::from_millis);

    Some(AcquireRequest {
        resource,
        mode,
        holder,
        lock_wait,
        ceiling: call.timeout(),
    })
}

fn parse_release(session: SessionId, call: &ProcedureCall) -> Option<(String, Holder)> {
    Some((resource_param(call)?, holder_param(session, call)?))
}

/// A session on an [`InMemoryLockServer`].
///
/// Owns at most one transaction at a time. Closing (or dropping) the
/// connection releases every lock the session holds.
pub struct InMemoryConnection {
    server: Arc<InMemoryLockServer>,
    session: SessionId,
    open: bool,
    transaction: Option<TransactionId>,
    next_transaction: u64,
}

impl InMemoryConnection {
    /// A closed connection to `server`.
    pub fn new(server: Arc<InMemoryLockServer>) -> Self {
        let session = server.next_session_id();
        InMemoryConnection {
            server,
            session,
            open: false,
            transaction: None,
            next_transaction: 1,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn begin_transaction(&mut self) -> Result<TransactionId, CallError> {
        if !self.open {
            return Err(CallError::ConnectionClosed);
        }
        if self.transaction.is_some() {
            return Err(CallError::Transport(
                "a transaction is already active on this connection".into(),
            ));
        }
        let tx = TransactionId(self.next_transaction);
        self.next_transaction += 1;
        self.transaction = Some(tx);
        Ok(tx)
    }

    pub fn commit(&mut self) -> Result<(), CallError> {
        self.end_transaction()
    }

    pub fn rollback(&mut self) -> Result<(), CallError> {
        self.end_transaction()
    }

    fn end_transaction(&mut self) -> Result<(), CallError> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| CallError::Transport("no transaction is active".into()))?;
        self.server.end_transaction(self.session, tx);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.open {
            self.transaction = None;
            self.server.close_session(self.session);
            self.open = false;
        }
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl Connection for InMemoryConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<(), CallError> {
        self.open = true;
        Ok(())
    }

    fn current_transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    fn execute(&mut self, call: &ProcedureCall) -> Result<Option<i32>, CallError> {
        if !self.open {
            return Err(CallError::ConnectionClosed);
        }
        if call.transaction().is_some() && call.transaction() != self.transaction {
            return Err(CallError::Transport(
                "call is bound to a transaction that is not active on this connection".into(),
            ));
        }
        match call.procedure() {
            GET_APP_LOCK => self.server.get_app_lock(self.session, call),
            RELEASE_APP_LOCK => self.server.release_app_lock(self.session, call),
            other => Err(CallError::database(
                2812,
                format!("Could not find stored procedure '{}'.", other),
            )),
        }
    }
}
