//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler → Result<T, ApiError>                                          │
//! │       │                                                                 │
//! │       ├── JsonRejection ─────────────────────► VALIDATION_ERROR (400)  │
//! │       ├── DbError::Domain(CoreError) ────────► domain code             │
//! │       └── DbError (sqlx, pool, commit) ──────► DATABASE_ERROR (500)    │
//! │                                                 (logged, generic text) │
//! │                                                                         │
//! │  Response: HTTP status + {"code": "...", "message": "..."}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "PRICE_MISMATCH",
///   "message": "Price mismatch for product ...: submitted 90.00, expected 100.00",
///   "details": { "product_id": "...", "submitted_cents": 9000, "expected_cents": 10000 }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    PriceMismatch,
    TotalMismatch,
    OutOfStock,
    InsufficientStock,
    CustomerTypeLocked,
    PasswordRequired,
    IncorrectPassword,
    NotFound,
    NotRestorable,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::PriceMismatch
            | ErrorCode::TotalMismatch
            | ErrorCode::OutOfStock
            | ErrorCode::InsufficientStock
            | ErrorCode::PasswordRequired => StatusCode::BAD_REQUEST,
            ErrorCode::CustomerTypeLocked | ErrorCode::IncorrectPassword => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::NotRestorable => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::NotFound { entity, id } => ApiError::new(ErrorCode::NotFound, message)
                .with_details(json!({ "entity": entity, "id": id })),
            CoreError::PriceMismatch {
                product_id,
                submitted,
                expected,
            } => ApiError::new(ErrorCode::PriceMismatch, message).with_details(json!({
                "product_id": product_id,
                "submitted_cents": submitted.cents(),
                "expected_cents": expected.cents(),
            })),
            CoreError::TotalMismatch {
                field,
                submitted,
                expected,
            } => ApiError::new(ErrorCode::TotalMismatch, message).with_details(json!({
                "field": field,
                "submitted_cents": submitted.cents(),
                "expected_cents": expected.cents(),
            })),
            CoreError::OutOfStock { product_id, requested } => ApiError::new(ErrorCode::OutOfStock, message)
                .with_details(json!({ "product_id": product_id, "requested": requested })),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(ErrorCode::InsufficientStock, message).with_details(json!({
                "product_id": product_id,
                "available": available,
                "requested": requested,
            })),
            CoreError::CustomerTypeLocked { .. } => ApiError::new(ErrorCode::CustomerTypeLocked, message),
            CoreError::PasswordRequired => ApiError::new(ErrorCode::PasswordRequired, message),
            CoreError::IncorrectPassword => ApiError::new(ErrorCode::IncorrectPassword, message),
            CoreError::NotRestorable { .. } => ApiError::new(ErrorCode::NotRestorable, message),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => ApiError::from(e),
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                ApiError::new(ErrorCode::Internal, "Internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Money;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::PasswordRequired, StatusCode::BAD_REQUEST),
            (CoreError::IncorrectPassword, StatusCode::FORBIDDEN),
            (
                CoreError::CustomerTypeLocked {
                    sale_id: "s".into(),
                    current: "retail".into(),
                    requested: "long-term".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (CoreError::not_found("Sale", "s"), StatusCode::NOT_FOUND),
            (
                CoreError::NotRestorable {
                    item_type: "product".into(),
                    id: "d".into(),
                    reason: "gone".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::OutOfStock {
                    product_id: "p".into(),
                    requested: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_price_mismatch_details() {
        let err = ApiError::from(DbError::Domain(CoreError::PriceMismatch {
            product_id: "p-1".into(),
            submitted: Money::from_cents(9000),
            expected: Money::from_cents(10000),
        }));
        assert_eq!(err.code, ErrorCode::PriceMismatch);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "PRICE_MISMATCH");
        assert_eq!(body["details"]["expected_cents"], 10000);
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err = ApiError::from(DbError::QueryFailed("database is locked".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("locked"));
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
