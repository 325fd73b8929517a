//! # Promo Codes
//!
//! Discount rules and the checks a code must pass before it discounts an order.
//!
//! ## Validation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  code + subtotal + now                                                  │
//! │       │                                                                 │
//! │       ├── not found / inactive? ────────► InvalidCode                   │
//! │       ├── now outside [from, until]? ──► Expired                        │
//! │       ├── usage_count >= limit? ───────► UsageLimitExceeded             │
//! │       ├── subtotal < min order? ───────► MinimumOrderNotMet             │
//! │       │                                                                 │
//! │       └── OK → discount (Fixed: amount, Percentage: floor % then cap)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation never mutates the code. Redemption (the usage counter bump)
//! is a separate atomic database update made when the payment order is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{PromoCodeError, ValidationError};
use crate::money::Money;
use crate::validation::{validate_promo_code_format, ValidationResult};

// =============================================================================
// Discount Rule
// =============================================================================

/// How a promo code discounts the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountRule {
    /// Flat amount off.
    Fixed { amount: Money },
    /// Percentage of the subtotal, rounded down, optionally capped.
    Percentage { percent: u32, cap: Option<Money> },
}

impl DiscountRule {
    /// Discount this rule grants on `subtotal`.
    ///
    /// Never negative and never above the subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        if !subtotal.is_positive() {
            return Money::zero();
        }

        let raw = match *self {
            DiscountRule::Fixed { amount } => amount,
            DiscountRule::Percentage { percent, cap } => {
                let pct = subtotal.percentage(percent);
                match cap {
                    Some(cap) if cap < pct => cap,
                    _ => pct,
                }
            }
        };

        raw.clamp_between(Money::zero(), subtotal)
    }

    /// Checks the rule parameters an admin entered.
    pub fn validate(&self) -> ValidationResult<()> {
        match *self {
            DiscountRule::Fixed { amount } if !amount.is_positive() => {
                Err(ValidationError::MustBePositive {
                    field: "discount.amount".to_string(),
                })
            }
            DiscountRule::Percentage { percent, .. } if !(1..=100).contains(&percent) => {
                Err(ValidationError::OutOfRange {
                    field: "discount.percent".to_string(),
                    min: 1,
                    max: 100,
                })
            }
            DiscountRule::Percentage { cap: Some(cap), .. } if !cap.is_positive() => {
                Err(ValidationError::MustBePositive {
                    field: "discount.cap".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Promo Code
// =============================================================================

/// A promo code as stored in the catalog.
///
/// `code` is unique and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PromoCode {
    pub code: String,
    pub discount: DiscountRule,
    /// Minimum pre-discount subtotal.
    pub min_order_amount: Money,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    /// `None` means unlimited redemptions.
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Whether `now` falls inside the validity window (both ends inclusive).
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    /// Whether at least one redemption is left.
    pub fn has_remaining_uses(&self) -> bool {
        self.usage_limit
            .map_or(true, |limit| self.usage_count < limit)
    }

    /// Checks this code against an order subtotal and returns the discount.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use estamp_core::money::Money;
    /// use estamp_core::promo::{DiscountRule, PromoCode};
    ///
    /// let now = Utc::now();
    /// let promo = PromoCode {
    ///     code: "SUPER".to_string(),
    ///     discount: DiscountRule::Fixed { amount: Money::from_paise(1500) },
    ///     min_order_amount: Money::from_paise(10000),
    ///     valid_from: now - Duration::days(1),
    ///     valid_until: now + Duration::days(30),
    ///     usage_limit: None,
    ///     usage_count: 0,
    ///     is_active: true,
    ///     created_at: now,
    /// };
    ///
    /// assert_eq!(promo.validate(Money::from_paise(17797), now).unwrap().paise(), 1500);
    /// ```
    pub fn validate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<Money, PromoCodeError> {
        self.validate_for_order(subtotal, now, false)
    }

    /// Like [`PromoCode::validate`], for an order that may already hold a
    /// redemption of this code.
    ///
    /// With `already_redeemed` the usage limit is not checked, since one of
    /// the counted uses is this order's own.
    pub fn validate_for_order(
        &self,
        subtotal: Money,
        now: DateTime<Utc>,
        already_redeemed: bool,
    ) -> Result<Money, PromoCodeError> {
        if !self.is_active {
            return Err(PromoCodeError::InvalidCode {
                code: self.code.clone(),
            });
        }

        if !self.is_within_window(now) {
            return Err(PromoCodeError::Expired {
                code: self.code.clone(),
            });
        }

        if !already_redeemed && !self.has_remaining_uses() {
            return Err(PromoCodeError::UsageLimitExceeded {
                code: self.code.clone(),
            });
        }

        if subtotal < self.min_order_amount {
            return Err(PromoCodeError::MinimumOrderNotMet {
                code: self.code.clone(),
                minimum: self.min_order_amount,
                subtotal,
            });
        }

        Ok(self.discount.discount_for(subtotal))
    }
}

/// Validates a looked-up code.
///
/// `found` is the result of an exact, case-sensitive lookup of `code`;
/// `None` means no such code.
pub fn validate_promo(
    code: &str,
    found: Option<&PromoCode>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, PromoCodeError> {
    match found {
        Some(promo) if promo.code == code => promo.validate(subtotal, now),
        _ => Err(PromoCodeError::InvalidCode {
            code: code.to_string(),
        }),
    }
}

// =============================================================================
// Admin Input
// =============================================================================

/// Admin input for a new promo code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPromoCode {
    pub code: String,
    pub discount: DiscountRule,
    #[serde(default)]
    pub min_order_amount: Money,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "String")]
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
}

impl NewPromoCode {
    /// Validates the input and returns it with a cleaned code.
    pub fn validated(self) -> ValidationResult<NewPromoCode> {
        let code = validate_promo_code_format(&self.code)?;
        self.discount.validate()?;

        if self.min_order_amount.is_negative() {
            return Err(ValidationError::InvalidFormat {
                field: "min_order_amount".to_string(),
                reason: "cannot be negative".to_string(),
            });
        }

        if self.valid_until < self.valid_from {
            return Err(ValidationError::InvalidFormat {
                field: "valid_until".to_string(),
                reason: "must not be before valid_from".to_string(),
            });
        }

        if matches!(self.usage_limit, Some(limit) if limit <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "usage_limit".to_string(),
            });
        }

        Ok(NewPromoCode { code, ..self })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
