//! # estamp-core: Pure Business Logic for E-Stamp Orders
//!
//! Pricing, promo codes, the order lifecycle and payment signature checks,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        E-Stamp Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React wizard)                      │   │
//! │  │   Template ──► Parties ──► Service ──► Promo ──► Pay ──► Poll   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    estamp-api (salvo)                           │   │
//! │  │        handlers, order service, payment gateway client          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ estamp-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ pricing │ │  promo  │ │  order  │ │ payment │ │validate │  │   │
//! │  │   │Breakdown│ │Discount │ │ Status  │ │Signature│ │ phones  │  │   │
//! │  │   │  Calc   │ │  Rule   │ │ machine │ │ Verifier│ │ amounts │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    estamp-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer paise arithmetic
//! - [`types`] - Catalog types (StampTemplate, ServiceType, Party)
//! - [`pricing`] - Price breakdown calculator
//! - [`promo`] - Promo codes and discount rules
//! - [`order`] - The StampOrder aggregate and its status machine
//! - [`payment`] - Gateway signature verification
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use estamp_core::money::Money;
//! use estamp_core::promo::DiscountRule;
//!
//! let rule = DiscountRule::Percentage {
//!     percent: 20,
//!     cap: Some(Money::from_paise(10000)),
//! };
//!
//! // 20% of ₹1000 is ₹200, capped at ₹100
//! assert_eq!(rule.discount_for(Money::from_paise(100000)).paise(), 10000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod promo;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{
    CoreError, CoreResult, PaymentVerificationError, PromoCodeError, StateTransitionError,
    ValidationError,
};
pub use money::Money;
pub use order::{OrderDraft, OrderStatus, ServiceSelection, StampOrder};
pub use payment::{PaymentConfirmation, PaymentSignatureVerifier, VerifiedPayment};
pub use pricing::{PriceBreakdown, PricingCalculator, PricingInput, DEFAULT_DOORSTEP_CHARGE};
pub use promo::{DiscountRule, NewPromoCode, PromoCode};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of human-readable order numbers (`ES-20250101-3F9A1C`).
pub const ORDER_NUMBER_PREFIX: &str = "ES";

/// Maximum length of a party name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of free-text fields (purpose, address, description).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum length of a promo code.
pub const MAX_PROMO_CODE_LENGTH: usize = 32;

/// Largest stamp amount or catalog price accepted, ₹100 crore in paise.
///
/// Keeps every breakdown sum far inside `i64`.
pub const MAX_AMOUNT: Money = Money::from_paise(100_000_000_000);
