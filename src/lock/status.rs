//! Return-code tables for the app-lock procedures.
//!
//! Every integer the database can hand back maps to exactly one variant,
//! including the absent value and codes outside the documented set.

use std::fmt;

/// Outcome of `sp_getapplock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStatus {
    Granted,
    GrantedAfterWait,
    TimedOut,
    Canceled,
    Deadlock,
    ParamOrCallError,
    /// The procedure produced no return value.
    Missing,
    Unrecognized(i32),
}

impl AcquireStatus {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => AcquireStatus::Granted,
            Some(1) => AcquireStatus::GrantedAfterWait,
            Some(-1) => AcquireStatus::TimedOut,
            Some(-2) => AcquireStatus::Canceled,
            Some(-3) => AcquireStatus::Deadlock,
            Some(-999) => AcquireStatus::ParamOrCallError,
            Some(other) => AcquireStatus::Unrecognized(other),
            None => AcquireStatus::Missing,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            AcquireStatus::Granted => Some(0),
            AcquireStatus::GrantedAfterWait => Some(1),
            AcquireStatus::TimedOut => Some(-1),
            AcquireStatus::Canceled => Some(-2),
            AcquireStatus::Deadlock => Some(-3),
            AcquireStatus::ParamOrCallError => Some(-999),
            AcquireStatus::Unrecognized(code) => Some(*code),
            AcquireStatus::Missing => None,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            AcquireStatus::Granted | AcquireStatus::GrantedAfterWait
        )
    }
}

impl fmt::Display for AcquireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireStatus::Granted => f.write_str("Granted (0)"),
            AcquireStatus::GrantedAfterWait => f.write_str("GrantedAfterWait (1)"),
            AcquireStatus::TimedOut => f.write_str("RequestTimeout (-1)"),
            AcquireStatus::Canceled => f.write_str("RequestCanceled (-2)"),
            AcquireStatus::Deadlock => f.write_str("RequestDeadlock (-3)"),
            AcquireStatus::ParamOrCallError => f.write_str("ParmOrCallError (-999)"),
            AcquireStatus::Missing => f.write_str("null"),
            AcquireStatus::Unrecognized(code) => write!(f, "{}", code),
        }
    }
}

/// Outcome of `sp_releaseapplock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    Released,
    ParamOrCallError,
    Missing,
    Unrecognized(i32),
}

impl ReleaseStatus {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ReleaseStatus::Released,
            Some(-999) => ReleaseStatus::ParamOrCallError,
            Some(other) => ReleaseStatus::Unrecognized(other),
            None => ReleaseStatus::Missing,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ReleaseStatus::Released => Some(0),
            ReleaseStatus::ParamOrCallError => Some(-999),
            ReleaseStatus::Unrecognized(code) => Some(*code),
            ReleaseStatus::Missing => None,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseStatus::Released)
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStatus::Released => f.write_str("Released (0)"),
            ReleaseStatus::ParamOrCallError => f.write_str("ParmOrCallError (-999)"),
            ReleaseStatus::Missing => f.write_str("null"),
            ReleaseStatus::Unrecognized(code) => write!(f, "{}", code),
        }
    }
}
