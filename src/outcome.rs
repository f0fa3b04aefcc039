use serde::{Deserialize, Serialize};

const UNSPECIFIED_FAILURE: &str = "operation failed without a diagnostic message";

/// Uniform success/failure value returned by every public lock operation.
///
/// A success carries no messages. A failure carries one or more
/// human-readable diagnostics, in the order they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    is_success: bool,
    messages: Vec<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Outcome {
            is_success: true,
            messages: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome {
            is_success: false,
            messages: vec![message.into()],
        }
    }

    /// A failure carrying `messages`. An empty list still yields one
    /// generic message, so every failure has a diagnostic.
    pub fn failure_with(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            return Self::failure(UNSPECIFIED_FAILURE);
        }
        Outcome {
            is_success: false,
            messages,
        }
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}
