//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Mesa                                   │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /restaurants/{id}/menu-items                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::UniqueViolation ──┐               │  │
//! │  │         │                                       │               │  │
//! │  │         ▼                                       ▼               │  │
//! │  │  Business Error? ─── CoreError::LimitExceeded ── ApiError ─────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄──── 402 { "code": "LIMIT_EXCEEDED", "message": "..." }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | Code              | Status |
//! |-------------------|--------|
//! | `INVALID_INPUT`   | 400    |
//! | `UNAUTHENTICATED` | 401    |
//! | `LIMIT_EXCEEDED`  | 402    |
//! | `FORBIDDEN`       | 403    |
//! | `NOT_FOUND`       | 404    |
//! | `CONFLICT`        | 409    |
//! | `INTERNAL`        | 500    |
//!
//! Internal errors are logged with their detail and answered with a generic
//! message; sqlx, argon2 and jsonwebtoken text never reaches the client.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use mesa_core::{CoreError, ResourceKind, ValidationError};
use mesa_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// This is the body the client receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Restaurant not found: 1b0c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    Unauthenticated,
    LimitExceeded,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::LimitExceeded => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn limit_exceeded(resource: ResourceKind) -> Self {
        CoreError::LimitExceeded {
            resource,
            limit: resource.free_tier_limit(),
        }
        .into()
    }

    /// The detail is logged and kept on the value for tests; the response
    /// body carries a generic message.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.code == ErrorCode::Internal {
            error!(detail = %self.message, "Internal error");
            ApiError::internal("Internal server error")
        } else {
            self
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            dup @ DbError::UniqueViolation { .. } => ApiError::conflict(dup.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::invalid_input("Referenced record does not exist")
            }
            DbError::CheckViolation(_) => ApiError::invalid_input("Value out of range"),
            other => ApiError::internal(other.to_string()),
        }
    }
}

/// Converts core business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::MenuItemNotFound(_) => ErrorCode::InvalidInput,
            CoreError::LimitExceeded { .. } => ErrorCode::LimitExceeded,
            CoreError::InvalidOrderTransition { .. } => ErrorCode::Conflict,
            CoreError::AmountOverflow(_) | CoreError::Validation(_) => ErrorCode::InvalidInput,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

/// Result alias for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("email", "a@b.co").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::not_found("Order", "o-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Order not found: o-1");

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_limit_exceeded_is_payment_required() {
        let err = ApiError::limit_exceeded(ResourceKind::MenuItems);
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
        assert!(err.message.contains("menu items"));
        assert!(err.message.contains('5'));
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err: ApiError = CoreError::InvalidOrderTransition {
            order_id: "o-1".to_string(),
            current_status: "paid".to_string(),
            requested: "pending".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_amount_overflow_is_invalid_input() {
        let err: ApiError = CoreError::AmountOverflow("total sales for 2025-08-15".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_value(ApiError::forbidden("nope")).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let response = ApiError::internal("sqlx exploded").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
