//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Order API                          │
//! │                                                                         │
//! │  Handler ── Result<Json<T>, ApiError>                                   │
//! │     │                                                                   │
//! │     ├── ValidationError ─────────────► 400 VALIDATION_ERROR             │
//! │     ├── PromoCodeError ──────────────► 422 INVALID_CODE | EXPIRED | ... │
//! │     ├── PaymentVerificationError ────► 400 PAYMENT_VERIFICATION_FAILED  │
//! │     ├── StateTransitionError ────────► 409 INVALID_TRANSITION           │
//! │     ├── DbError::UniqueViolation ────► 409 CONFLICT                     │
//! │     ├── not found ───────────────────► 404 NOT_FOUND                    │
//! │     ├── GatewayError ────────────────► 502 GATEWAY_ERROR                │
//! │     └── storage failure ─────────────► 500 (detail logged, not sent)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! { "code": "MINIMUM_ORDER_NOT_MET", "message": "Promo code SUPER requires ..." }
//! ```

use salvo::http::{ParseError, StatusCode};
use salvo::prelude::{Json, Response, Scribe};
use serde::Serialize;
use thiserror::Error;

use estamp_core::{
    CoreError, PaymentVerificationError, PromoCodeError, StateTransitionError, ValidationError,
};
use estamp_db::DbError;

use crate::gateway::GatewayError;

/// Result alias for handlers and the order service.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
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
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Promo code does not exist or is inactive (422)
    InvalidCode,

    /// Promo code outside its validity window (422)
    Expired,

    /// Promo code has no redemptions left (422)
    UsageLimitExceeded,

    /// Order subtotal below the promo minimum (422)
    MinimumOrderNotMet,

    /// Gateway signature did not verify (400)
    PaymentVerificationFailed,

    /// Order status does not allow the action (409)
    InvalidTransition,

    /// Duplicate resource (409)
    Conflict,

    /// Payment gateway unreachable or refused the request (502)
    GatewayError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status sent with this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::PaymentVerificationFailed => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::InvalidCode
            | ErrorCode::Expired
            | ErrorCode::UsageLimitExceeded
            | ErrorCode::MinimumOrderNotMet => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidTransition | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::GatewayError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Writes the error as a JSON body with the matching status code.
impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.code.status());
        res.render(Json(self));
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::StatusConflict { id, expected } => ApiError::new(
                ErrorCode::InvalidTransition,
                format!("Order {} was changed concurrently and is no longer {}", id, expected),
            ),
            DbError::PromoUnavailable { code } => PromoCodeError::UsageLimitExceeded { code }.into(),
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
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::CorruptRow { entity, reason } => {
                tracing::error!(entity = %entity, reason = %reason, "Corrupt row");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TemplateNotFound {
                state,
                document_type,
            } => ApiError::not_found("Template", &format!("{} / {}", state, document_type)),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::Promo(e) => e.into(),
            CoreError::PaymentVerification(e) => e.into(),
            CoreError::InvalidTransition(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PromoCodeError> for ApiError {
    fn from(err: PromoCodeError) -> Self {
        let code = match err {
            PromoCodeError::InvalidCode { .. } => ErrorCode::InvalidCode,
            PromoCodeError::Expired { .. } => ErrorCode::Expired,
            PromoCodeError::UsageLimitExceeded { .. } => ErrorCode::UsageLimitExceeded,
            PromoCodeError::MinimumOrderNotMet { .. } => ErrorCode::MinimumOrderNotMet,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<PaymentVerificationError> for ApiError {
    fn from(err: PaymentVerificationError) -> Self {
        ApiError::new(ErrorCode::PaymentVerificationFailed, err.to_string())
    }
}

impl From<StateTransitionError> for ApiError {
    fn from(err: StateTransitionError) -> Self {
        ApiError::new(ErrorCode::InvalidTransition, err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        tracing::error!("Payment gateway call failed: {}", err);
        ApiError::new(ErrorCode::GatewayError, "Payment gateway is unavailable")
    }
}

/// Malformed request bodies.
impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::validation(format!("Invalid request body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estamp_core::{Money, OrderStatus};

    #[test]
    fn test_promo_errors_keep_their_subtype() {
        let err: ApiError = PromoCodeError::MinimumOrderNotMet {
            code: "SUPER".to_string(),
            minimum: Money::from_paise(10000),
            subtotal: Money::from_paise(5000),
        }
        .into();

        assert_eq!(err.code, ErrorCode::MinimumOrderNotMet);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_transition_is_conflict() {
        let err: ApiError = CoreError::from(StateTransitionError {
            from: OrderStatus::Draft,
            to: OrderStatus::Generated,
        })
        .into();

        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_db_errors_hide_details() {
        let err: ApiError = DbError::QueryFailed("no such column: secret_col".to_string()).into();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secret_col"));
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_is_conflict_and_exhausted_promo_is_unprocessable() {
        let dup: ApiError = DbError::UniqueViolation {
            field: "stamp_templates.state, stamp_templates.document_type".to_string(),
            value: "Karnataka / Affidavit".to_string(),
        }
        .into();
        let exhausted: ApiError = DbError::PromoUnavailable {
            code: "LAUNCH".to_string(),
        }
        .into();

        assert_eq!(dup.code.status(), StatusCode::CONFLICT);
        assert_eq!(exhausted.code, ErrorCode::UsageLimitExceeded);
    }

    #[test]
    fn test_serialized_shape() -> Result<(), serde_json::Error> {
        let err = ApiError::new(ErrorCode::UsageLimitExceeded, "used up");
        let json = serde_json::to_value(&err)?;

        assert_eq!(json["code"], "USAGE_LIMIT_EXCEEDED");
        assert_eq!(json["message"], "used up");
        Ok(())
    }
}
