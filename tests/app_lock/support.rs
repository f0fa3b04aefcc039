//! Shared fixtures: a scripted connection and log capture.

use std::collections::VecDeque;
use std::sync::Once;

use applock_rust::{CallError, Connection, ProcedureCall, TransactionId};

/// What the next `execute` call does.
#[allow(dead_code)]
pub enum Reply {
    Code(Option<i32>),
    Fail(CallError),
    Panic(&'static str),
}

/// A connection that records every call and answers from a script.
///
/// Once the script runs out, every call returns status 0.
pub struct ScriptedConnection {
    pub open: bool,
    pub transaction: Option<TransactionId>,
    pub open_calls: usize,
    pub open_error: Option<CallError>,
    pub calls: Vec<ProcedureCall>,
    replies: VecDeque<Reply>,
}

#[allow(dead_code)]
impl ScriptedConnection {
    pub fn new() -> Self {
        ScriptedConnection {
            open: true,
            transaction: None,
            open_calls: 0,
            open_error: None,
            calls: Vec::new(),
            replies: VecDeque::new(),
        }
    }

    pub fn closed() -> Self {
        ScriptedConnection {
            open: false,
            ..Self::new()
        }
    }

    pub fn in_transaction(mut self, tx: u64) -> Self {
        self.transaction = Some(TransactionId(tx));
        self
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    pub fn code(self, code: i32) -> Self {
        self.reply(Reply::Code(Some(code)))
    }

    pub fn last_call(&self) -> &ProcedureCall {
        self.calls.last().expect("no call was executed")
    }
}

impl Connection for ScriptedConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<(), CallError> {
        self.open_calls += 1;
        if let Some(err) = self.open_error.clone() {
            return Err(err);
        }
        self.open = true;
        Ok(())
    }

    fn current_transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    fn execute(&mut self, call: &ProcedureCall) -> Result<Option<i32>, CallError> {
        self.calls.push(call.clone());
        match self.replies.pop_front() {
            Some(Reply::Code(code)) => Ok(code),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Panic(message)) => panic!("{}", message),
            None => Ok(Some(0)),
        }
    }
}

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
