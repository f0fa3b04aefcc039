use std::fmt;
use std::time::Duration;

/// Identifier of a transaction currently active on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Typed parameter value, mirroring the SQL column types the lock
/// procedures declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    NVarChar { value: String, max_len: usize },
    VarChar { value: String, max_len: usize },
    Int(i32),
}

impl SqlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::NVarChar { value, .. } | SqlValue::VarChar { value, .. } => Some(value),
            SqlValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            SqlValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub value: SqlValue,
}

/// A parameterized stored-procedure call, optionally bound to a transaction.
///
/// The procedure's integer return value travels back as the result of
/// [`Connection::execute`](super::Connection::execute), not as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    procedure: &'static str,
    parameters: Vec<Parameter>,
    transaction: Option<TransactionId>,
    timeout: Option<Duration>,
}

impl ProcedureCall {
    pub fn new(procedure: &'static str) -> Self {
        ProcedureCall {
            procedure,
            parameters: Vec::new(),
            transaction: None,
            timeout: None,
        }
    }

    pub fn param(mut self, name: &'static str, value: SqlValue) -> Self {
        self.parameters.push(Parameter { name, value });
        self
    }

    /// Bind the call to a transaction so it executes within its scope.
    pub fn in_transaction(mut self, transaction: TransactionId) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Execution-timeout ceiling. `None` means the call may run unbounded.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn procedure(&self) -> &'static str {
        self.procedure
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
