//! # Validation Module
//!
//! Input validation utilities for the RidePass register.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register boundary (operator commands)                        │
//! │  ├── THIS MODULE: phone, quantity, price, cart size                    │
//! │  └── Rejected input never reaches the fan-out engine                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Fan-out engine (pure)                                        │
//! │  └── Trusts its input; only refuses an empty cart                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote collaborators                                         │
//! │  └── 400 responses drive the bad-request policy                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ridepass_core::validation::{validate_phone, validate_quantity};
//!
//! assert_eq!(validate_phone(" 9876543210 ").unwrap(), "9876543210");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Length of a customer phone number accepted for loyalty.
pub const PHONE_DIGITS: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer phone number.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Exactly 10 ASCII digits
///
/// ## Returns
/// The trimmed phone number.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.len() != PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!("must be exactly {PHONE_DIGITS} digits"),
        });
    }

    Ok(phone.to_string())
}

/// Returns true when the phone qualifies for loyalty calls.
///
/// Used where an invalid phone must be ignored instead of rejected.
pub fn is_loyalty_phone(phone: &str) -> bool {
    validate_phone(phone).is_ok()
}

/// Validates a product reference from the catalog.
pub fn validate_product_ref(product_ref: &str) -> ValidationResult<()> {
    if product_ref.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  add 19 6                                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(6) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Cart::add_product                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in paise.
///
/// Zero is allowed (the loyalty reward line is free).
pub fn validate_price_paise(paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines) before adding one more.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("9876543210").unwrap(), "9876543210");
        assert_eq!(validate_phone("  9876543210\n").unwrap(), "9876543210");

        assert!(validate_phone("").is_err());
        assert!(validate_phone("987654321").is_err());
        assert!(validate_phone("98765432100").is_err());
        assert!(validate_phone("98765-4321").is_err());
        assert!(validate_phone("९८७६५४३२१०").is_err());
    }

    #[test]
    fn test_is_loyalty_phone() {
        assert!(is_loyalty_phone("9876543210"));
        assert!(!is_loyalty_phone("12345"));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_paise() {
        assert!(validate_price_paise(0).is_ok());
        assert!(validate_price_paise(5000).is_ok());
        assert!(validate_price_paise(-100).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

    #[test]
    fn test_validate_product_ref() {
        assert!(validate_product_ref("19").is_ok());
        assert!(validate_product_ref("  ").is_err());
    }
}
