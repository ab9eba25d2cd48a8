//! # Operator Error Type
//!
//! What the operator sees when a command fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin line ──► Command::parse ── ParseError ──────────┐               │
//! │                      │                                  │               │
//! │                      ▼                                  ▼               │
//! │               Register method ── SyncError ──────► OperatorError        │
//! │                      │            CoreError              │              │
//! │                      ▼                                   ▼              │
//! │                   reply                       "error [CODE] message"   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use ridepass_core::CoreError;
use ridepass_sync::SyncError;

/// Returned from every command handler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorError {
    /// Machine-readable code for scripted front ends.
    pub code: ErrorCode,

    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown product or nothing to reprint.
    NotFound,

    /// Bad operator input (phone, quantity, command syntax).
    ValidationError,

    /// The action is not allowed in the register's current state.
    InvalidState,

    /// Cart limits exceeded.
    CartError,

    /// Local database failure.
    DatabaseError,

    /// Remote service unreachable or refused.
    NetworkError,

    Internal,
}

impl OperatorError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        OperatorError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OperatorError::new(ErrorCode::ValidationError, message)
    }
}

/// Malformed operator input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    NotANumber(String),
}

impl From<ParseError> for OperatorError {
    fn from(err: ParseError) -> Self {
        OperatorError::validation(err.to_string())
    }
}

impl From<CoreError> for OperatorError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::ProductNotInCart(_) | CoreError::NoBundle => {
                ErrorCode::NotFound
            }
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidState,
        };
        OperatorError::new(code, err.to_string())
    }
}

impl From<SyncError> for OperatorError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Core(e) => e.into(),
            SyncError::DatabaseError(e) => {
                tracing::error!("Database operation failed: {}", e);
                OperatorError::new(ErrorCode::DatabaseError, "Local database operation failed")
            }
            e if e.is_retryable() => OperatorError::new(ErrorCode::NetworkError, e.to_string()),
            e @ SyncError::Http { .. } => OperatorError::new(ErrorCode::NetworkError, e.to_string()),
            other => OperatorError::new(ErrorCode::Internal, other.to_string()),
        }
    }
}

impl std::fmt::Display for OperatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for OperatorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepass_core::{RegisterAction, RegisterState};

    #[test]
    fn test_core_error_codes() {
        let err: OperatorError = CoreError::ProductNotFound("99".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: OperatorError = CoreError::InvalidTransition {
            state: RegisterState::AwaitingConfirm,
            action: RegisterAction::EditCart,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_sync_error_unwraps_core() {
        let err: OperatorError = SyncError::Core(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(err.to_string(), "[CART_ERROR] Cart is empty");
    }

    #[test]
    fn test_network_errors() {
        let err: OperatorError = SyncError::Timeout("10s".into()).into();
        assert_eq!(err.code, ErrorCode::NetworkError);
    }
}
