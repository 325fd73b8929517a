//! # Error Types
//!
//! Domain-specific error types for estamp-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  estamp-core errors (this file)                                        │
//! │  ├── CoreError                 - Umbrella for domain failures          │
//! │  ├── ValidationError           - Malformed input, no retry             │
//! │  ├── PromoCodeError            - User may correct and retry            │
//! │  ├── PaymentVerificationError  - Fatal for this payment attempt        │
//! │  └── StateTransitionError      - Client/server desync (conflict)       │
//! │                                                                         │
//! │  estamp-db errors (separate crate)                                     │
//! │  └── DbError                   - Database operation failures           │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError                  - What the frontend sees (serialized)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::order::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No active template for the requested (state, document type) pair.
    #[error("No stamp template for {document_type} in {state}")]
    TemplateNotFound {
        state: String,
        document_type: String,
    },

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Promo code rejected.
    #[error(transparent)]
    Promo(#[from] PromoCodeError),

    /// Gateway signature did not check out.
    #[error(transparent)]
    PaymentVerification(#[from] PaymentVerificationError),

    /// Attempted status change is not allowed from the current status.
    #[error(transparent)]
    InvalidTransition(#[from] StateTransitionError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Promo Code Error
// =============================================================================

/// Reasons a promo code cannot be applied.
///
/// ## Check Order
/// ```text
/// lookup ──► InvalidCode ──► Expired ──► UsageLimitExceeded ──► MinimumOrderNotMet
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoCodeError {
    /// Code does not exist or has been deactivated.
    #[error("Promo code {code} is not valid")]
    InvalidCode { code: String },

    /// Outside the code's validity window.
    #[error("Promo code {code} has expired or is not active yet")]
    Expired { code: String },

    /// Every permitted redemption has been used.
    #[error("Promo code {code} has reached its usage limit")]
    UsageLimitExceeded { code: String },

    /// Cart subtotal is below the code's minimum order amount.
    #[error("Promo code {code} requires a minimum order of {minimum}, order is {subtotal}")]
    MinimumOrderNotMet {
        code: String,
        minimum: Money,
        subtotal: Money,
    },
}

impl PromoCodeError {
    /// Machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PromoCodeError::InvalidCode { .. } => "INVALID_CODE",
            PromoCodeError::Expired { .. } => "EXPIRED",
            PromoCodeError::UsageLimitExceeded { .. } => "USAGE_LIMIT_EXCEEDED",
            PromoCodeError::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
        }
    }
}

// =============================================================================
// Payment Verification Error
// =============================================================================

/// Gateway payment confirmation could not be verified.
///
/// The order stays in `pending_payment`; the customer may pay again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentVerificationError {
    /// Signature is not valid hex of the expected length.
    #[error("Payment signature is malformed")]
    MalformedSignature,

    /// Signature does not match the gateway order and payment ids.
    #[error("Payment signature does not match")]
    SignatureMismatch,

    /// Callback refers to a different gateway order than the one on record.
    #[error("Payment is for gateway order {received}, expected {expected}")]
    OrderMismatch { expected: String, received: String },
}

// =============================================================================
// State Transition Error
// =============================================================================

/// Order status change that the lifecycle does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot move order from {from} to {to}")]
pub struct StateTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Amount is below the minimum allowed for this product.
    #[error("{field} must be at least {minimum}")]
    BelowMinimum { field: String, minimum: Money },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone number, date window).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
