use crate::config::LockSettings;
use crate::connection::Connection;

use super::{LockOwner, ValidationError};

/// Check a lock request against the connection it will run on.
///
/// Rules run in order and the first failure wins. Nothing here talks to
/// the database; the connection is only asked for its current transaction.
pub fn validate(
    name: &str,
    owner: LockOwner,
    timeout_secs: i32,
    conn: &dyn Connection,
    settings: &LockSettings,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    // NVARCHAR width is counted in UTF-16 code units.
    let len = name.encode_utf16().count();
    if len > settings.max_resource_len {
        return Err(ValidationError::NameTooLong {
            len,
            max: settings.max_resource_len,
        });
    }

    if timeout_secs < 0 {
        return Err(ValidationError::NegativeTimeout(timeout_secs));
    }

    if owner == LockOwner::Transaction && conn.current_transaction().is_none() {
        return Err(ValidationError::NoActiveTransaction);
    }

    Ok(())
}
