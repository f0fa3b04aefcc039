use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Lock mode, in the vocabulary of the database's app-lock primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockMode {
    Shared,
    Update,
    IntentShared,
    IntentExclusive,
    Exclusive,
}

impl LockMode {
    pub const ALL: [LockMode; 5] = [
        LockMode::Shared,
        LockMode::Update,
        LockMode::IntentShared,
        LockMode::IntentExclusive,
        LockMode::Exclusive,
    ];

    /// Token sent as `@LockMode`.
    pub fn as_token(&self) -> &'static str {
        match self {
            LockMode::Shared => "Shared",
            LockMode::Update => "Update",
            LockMode::IntentShared => "IntentShared",
            LockMode::IntentExclusive => "IntentExclusive",
            LockMode::Exclusive => "Exclusive",
        }
    }

    /// Whether a grant in `self` can coexist with a grant in `other`
    /// held by a different owner.
    pub fn is_compatible_with(&self, other: LockMode) -> bool {
        use LockMode::*;
        match (self, other) {
            (Exclusive, _) | (_, Exclusive) => false,
            (IntentShared, _) | (_, IntentShared) => true,
            (IntentExclusive, IntentExclusive) => true,
            (IntentExclusive, _) | (_, IntentExclusive) => false,
            (Update, Update) => false,
            _ => true,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for LockMode {
    type Err = ValidationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        LockMode::ALL
            .into_iter()
            .find(|mode| mode.as_token() == token)
            .ok_or_else(|| ValidationError::UnknownMode(token.to_string()))
    }
}

/// Scope a lock is held in.
///
/// `Session` locks live until released or until the connection closes.
/// `Transaction` locks end with the transaction and are never released
/// by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockOwner {
    Session,
    Transaction,
}

impl LockOwner {
    /// Token sent as `@LockOwner`.
    pub fn as_token(&self) -> &'static str {
        match self {
            LockOwner::Session => "Session",
            LockOwner::Transaction => "Transaction",
        }
    }
}

impl fmt::Display for LockOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for LockOwner {
    type Err = ValidationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "Session" => Ok(LockOwner::Session),
            "Transaction" => Ok(LockOwner::Transaction),
            other => Err(ValidationError::UnknownOwner(other.to_string())),
        }
    }
}
