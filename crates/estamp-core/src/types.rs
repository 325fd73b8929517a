//! # Domain Types
//!
//! Catalog and checkout types shared by the order flow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StampTemplate  │   │   ServiceType   │   │     Party       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  state          │   │  Standard  +0   │   │  name           │       │
//! │  │  document_type  │   │  Express   +100 │   │  phone          │       │
//! │  │  base_price     │   └─────────────────┘   └─────────────────┘       │
//! │  │  convenience_fee│                                                    │
//! │  └─────────────────┘   (orders live in `order`, promos in `promo`)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Surcharge for express processing (₹100).
pub const EXPRESS_SURCHARGE: Money = Money::from_paise(10000);

// =============================================================================
// Stamp Template
// =============================================================================

/// A priceable stamp-paper product for one state and document type.
///
/// Unique on `(state, document_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StampTemplate {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Issuing state, e.g. "Karnataka".
    pub state: String,

    /// Document type, e.g. "Rental Agreement".
    pub document_type: String,

    /// Minimum stamp duty for this document; also the default stamp amount.
    pub base_price: Money,

    /// Platform fee added on top of the stamp duty.
    pub convenience_fee: Money,

    pub description: Option<String>,

    /// Inactive templates are hidden from the catalog.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StampTemplate {
    /// Checks a customer-entered stamp amount against this template.
    ///
    /// The stamp amount may exceed the base price (higher-value agreements
    /// need more duty) but never fall below it.
    pub fn accepts_stamp_amount(&self, amount: Money) -> bool {
        amount >= self.base_price
    }
}

/// Admin input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTemplate {
    pub state: String,
    pub document_type: String,
    pub base_price: Money,
    pub convenience_fee: Money,
    #[serde(default)]
    pub description: Option<String>,
}

/// Admin edit of an existing template. The (state, document type) key is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TemplateUpdate {
    pub base_price: Money,
    pub convenience_fee: Money,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Service Type
// =============================================================================

/// Processing tier chosen by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Normal turnaround, no surcharge.
    #[default]
    Standard,
    /// Priority processing.
    Express,
}

impl ServiceType {
    /// Surcharge added to the order for this tier.
    pub fn surcharge(&self) -> Money {
        match self {
            ServiceType::Standard => Money::zero(),
            ServiceType::Express => EXPRESS_SURCHARGE,
        }
    }
}

// =============================================================================
// Party
// =============================================================================

/// One side of the agreement printed on the stamp paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Party {
    pub name: String,
    /// Normalised 10-digit mobile number.
    pub phone: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
