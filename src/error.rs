use std::time::Duration;
use thiserror::Error;

use crate::session::SessionStatus;

/// Errors surfaced by the session controller and its remote clients.
///
/// None of these are fatal to the process: every failure leaves the
/// controller in a state from which the operation can be retried.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required credential or endpoint is not configured
    #[error("{0} is not configured")]
    ConfigMissing(String),

    /// The conversation API or feedback webhook rejected the call
    #[error("remote call failed{}: {message}", fmt_status(.status))]
    RemoteCallFailed {
        /// HTTP status, absent when the request never got a response
        status: Option<u16>,
        message: String,
    },

    /// Join, leave or device command failed on the transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Required local fields missing; nothing was sent
    #[error("validation error: {0}")]
    Validation(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Another call of the same kind is still in flight
    #[error("{0} already in progress")]
    Busy(&'static str),

    #[error("no active session")]
    NoSession,

    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

impl SessionError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Status attached to a remote failure, if any
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            Self::RemoteCallFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteCallFailed {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SessionError>;
