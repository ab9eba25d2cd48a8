//! # Sync Error Types
//!
//! Error types for orchestration, storage and collaborator calls.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Register            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Core (cart / state)    │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  NoBundle               │ │
//! │  │  ConfigLoad/Save│  │  Http status    │  │  (via CoreError)        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Storage      │  │  Serialization  │   SubmitError (separate):    │
//! │  │                 │  │                 │   Rejected { status } ──►    │
//! │  │  DatabaseError  │  │  Serialization  │     bad-request policy       │
//! │  │  Spool I/O      │  │  Deserialization│   Unavailable ──► queue      │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ridepass_core::CoreError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Orchestration error type.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid terminal configuration.
    #[error("Invalid terminal configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The remote service could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The remote service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Local database failure (settings store, journal).
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Filesystem failure (spool directory, config file).
    #[error("I/O error: {0}")]
    Io(String),

    // =========================================================================
    // Register Errors
    // =========================================================================
    /// Cart or state machine refusal.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a ticket batch was not accepted.
///
/// Only a 400 means the batch itself is bad. Anything else is treated as the
/// service being unavailable and the batch is kept for a later drain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Ticket batch rejected with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Ticket service unavailable: {0}")]
    Unavailable(String),
}

impl SubmitError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmitError::Rejected { .. })
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ridepass_db::DbError> for SyncError {
    fn from(err: ridepass_db::DbError) -> Self {
        SyncError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            SyncError::DeserializationFailed(err.to_string())
        } else {
            SyncError::SerializationFailed(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::BAD_REQUEST => SubmitError::Rejected {
                status: status.as_u16(),
            },
            _ => SubmitError::Unavailable(err.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the call may succeed once the network comes back.
    ///
    /// ## Retryable Errors
    /// - Connection failures
    /// - Timeouts
    /// - 5xx responses
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepass_core::{RegisterAction, RegisterState};

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout("10s".into()).is_retryable());
        assert!(SyncError::Http {
            status: 503,
            message: "down".into()
        }
        .is_retryable());

        assert!(!SyncError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(!SyncError::DatabaseError("locked".into()).is_config_error());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: SyncError = CoreError::InvalidTransition {
            state: RegisterState::Idle,
            action: RegisterAction::Confirm,
        }
        .into();
        assert_eq!(err.to_string(), "Cannot confirm while register is idle");
    }

    #[test]
    fn test_json_syntax_error_is_deserialization() {
        let json_err = serde_json::from_str::<Vec<i64>>("[1,").unwrap_err();
        let err: SyncError = json_err.into();
        assert!(matches!(err, SyncError::DeserializationFailed(_)));
    }

    #[test]
    fn test_submit_error_classification() {
        assert!(SubmitError::Rejected { status: 400 }.is_rejected());
        assert!(!SubmitError::Unavailable("timeout".into()).is_rejected());
    }
}
