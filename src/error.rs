//! Error types for the sync core.

use std::error::Error;
use std::fmt;

/// Error type for cache, mutation, and transport-facing operations.
///
/// Stale-response conflicts are intentionally absent: a late response losing
/// the sequence-number race is discarded internally and is never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Client-side validation rejected the input before any network call.
    Validation(String),
    /// Network failure or non-2xx response from the transport.
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// The transport reported 401. Surfaced distinctly so a collaborator can
    /// trigger credential refresh or forced sign-out; never retried here.
    Authentication(String),
    /// Payload encode/decode failed.
    Serde(String),
    /// Operation on a context that has been disposed.
    Disposed,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Validation(msg) => write!(f, "validation failed: {}", msg),
            SyncError::Transport {
                status: Some(code),
                message,
            } => write!(f, "transport error ({}): {}", code, message),
            SyncError::Transport {
                status: None,
                message,
            } => write!(f, "transport error: {}", message),
            SyncError::Authentication(msg) => write!(f, "authentication failed: {}", msg),
            SyncError::Serde(msg) => write!(f, "serialization error: {}", msg),
            SyncError::Disposed => write!(f, "sync context disposed"),
        }
    }
}

impl Error for SyncError {}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serde(err.to_string())
    }
}

impl SyncError {
    /// Build a transport error from an HTTP status code, mapping 401 to the
    /// distinct authentication variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 {
            SyncError::Authentication(message)
        } else {
            SyncError::Transport {
                status: Some(status),
                message,
            }
        }
    }

    /// Whether this error should drive a credential refresh / sign-out.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SyncError::Authentication(_))
    }

    /// Whether this error was raised locally, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}
