//! # Error Types
//!
//! Domain-specific error types for ridepass-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ridepass-core errors (this file)                                      │
//! │  ├── CoreError        - Cart, fan-out and register state violations    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ridepass-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  ridepass-sync errors (separate crate)                                 │
//! │  ├── SyncError        - Config, storage, transport failures            │
//! │  └── SubmitError      - Ticket batch rejected / unavailable            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → operator message      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product ref, state, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::session::{RegisterAction, RegisterState};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent operator actions the register refuses. None of them
/// happen after paper has been printed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product reference is not in the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product reference is not currently in the cart.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(String),

    /// Checkout or fan-out was attempted on an empty cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: (empty)
    ///      │
    ///      ▼
    /// checkout
    ///      │
    ///      ▼
    /// EmptyCart ──► no preview, no bundle, nothing printed
    /// ```
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The register is not in a state that allows the action.
    ///
    /// ## When This Occurs
    /// - Editing the cart while a preview awaits confirmation
    /// - Confirming when no preview is shown
    /// - Reprinting before anything was printed
    #[error("Cannot {action} while register is {state}")]
    InvalidTransition {
        state: RegisterState,
        action: RegisterAction,
    },

    /// An action needs a bundle the register does not hold.
    #[error("No ticket bundle available")]
    NoBundle,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the register boundary before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1000 exceeds maximum allowed (999)");

        let err = CoreError::InvalidTransition {
            state: RegisterState::AwaitingConfirm,
            action: RegisterAction::EditCart,
        };
        assert_eq!(
            err.to_string(),
            "Cannot edit cart while register is awaiting confirmation"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "phone".to_string(),
        };
        assert_eq!(err.to_string(), "phone is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "phone".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
