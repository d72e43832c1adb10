//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  tally-server errors                                                   │
//! │  └── ApiError         - What clients see ({code, message} + status)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries enough context (ids, submitted vs expected amounts,
//! available vs requested stock) for the client to diagnose the rejection.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity is absent or soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Submitted unit price diverges from the resolved price.
    ///
    /// ## When This Occurs
    /// ```text
    /// Client sends price_cents = 9000 for a retail sale
    ///      │
    ///      ▼
    /// PriceOracle: retail price = 10000
    ///      │
    ///      ▼
    /// |9000 - 10000| > 1 cent → PriceMismatch
    /// ```
    #[error("Price mismatch for product {product_id}: submitted {submitted}, expected {expected}")]
    PriceMismatch {
        product_id: String,
        submitted: Money,
        expected: Money,
    },

    /// Submitted subtotal/total diverges from the server recomputation.
    #[error("{field} mismatch: submitted {submitted}, expected {expected}")]
    TotalMismatch {
        field: String,
        submitted: Money,
        expected: Money,
    },

    /// Product has no stock at all.
    #[error("Product {product_id} is out of stock (requested {requested})")]
    OutOfStock { product_id: String, requested: i64 },

    /// Not enough stock to cover the requested quantity.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Attempt to change the classification of an existing sale.
    #[error("Customer type of sale {sale_id} is locked as '{current}', cannot change to '{requested}'")]
    CustomerTypeLocked {
        sale_id: String,
        current: String,
        requested: String,
    },

    /// Destructive operation called without the owner password.
    #[error("Password is required for this operation")]
    PasswordRequired,

    /// Destructive operation called with the wrong owner password.
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Archive record can no longer be restored.
    #[error("Archived {item_type} {id} cannot be restored: {reason}")]
    NotRestorable {
        item_type: String,
        id: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements and are raised
/// before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed body).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Collection must not be empty.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn not_allowed(field: impl Into<String>, allowed: &[&str]) -> Self {
        ValidationError::NotAllowed {
            field: field.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_has_both_quantities() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 3, requested 5"
        );
    }

    #[test]
    fn test_price_mismatch_message_has_both_prices() {
        let err = CoreError::PriceMismatch {
            product_id: "p-1".to_string(),
            submitted: Money::from_cents(9000),
            expected: Money::from_cents(10000),
        };
        assert_eq!(
            err.to_string(),
            "Price mismatch for product p-1: submitted 90.00, expected 100.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("customer_type").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(
            core_err.to_string(),
            "Validation error: customer_type is required"
        );
    }
}
