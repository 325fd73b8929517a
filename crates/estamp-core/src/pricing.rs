//! # Pricing
//!
//! Composes an order's price from its line items.
//!
//! ## Breakdown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   stamp paper        (stamp amount, at least the template base price)  │
//! │ + convenience fee    (template)                                        │
//! │ + service charge     (standard +0, express +₹100)                       │
//! │ + doorstep charge    (flat, only when delivery requested)              │
//! │ ─────────────────                                                       │
//! │ = subtotal           (what promo codes are validated against)          │
//! │ - discount           (capped so total never drops below stamp paper)   │
//! │ ─────────────────                                                       │
//! │ = total                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure and deterministic: the wizard recomputes it on every step.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::ServiceType;

/// Default flat doorstep delivery surcharge (₹50).
pub const DEFAULT_DOORSTEP_CHARGE: Money = Money::from_paise(5000);

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// Everything the calculator needs, already resolved from the template and
/// the promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingInput {
    /// Stamp duty amount printed on the paper.
    pub stamp_amount: Money,
    /// Template convenience fee.
    pub convenience_fee: Money,
    pub service_type: ServiceType,
    pub doorstep_delivery: bool,
    /// Discount granted by the promo code, before capping.
    pub discount: Money,
}

/// Itemised price of an order.
///
/// `total = stamp_paper + convenience_fee + service_charge + doorstep_charge - discount`
/// and `total >= stamp_paper` always hold; `discount` is the amount actually
/// applied after capping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    pub stamp_paper: Money,
    pub convenience_fee: Money,
    pub service_charge: Money,
    pub doorstep_charge: Money,
    pub discount: Money,
    pub total: Money,
}

impl PriceBreakdown {
    /// Sum of all charges before the discount.
    pub fn subtotal(&self) -> Money {
        self.stamp_paper + self.convenience_fee + self.service_charge + self.doorstep_charge
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Price calculator with the deployment's surcharge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingCalculator {
    doorstep_charge: Money,
}

impl PricingCalculator {
    /// Creates a calculator charging `doorstep_charge` for doorstep delivery.
    pub fn new(doorstep_charge: Money) -> Self {
        PricingCalculator { doorstep_charge }
    }

    /// Flat doorstep delivery surcharge in effect.
    pub fn doorstep_charge(&self) -> Money {
        self.doorstep_charge
    }

    /// Pre-discount subtotal, the amount promo codes are checked against.
    pub fn subtotal(&self, input: &PricingInput) -> Money {
        self.undiscounted(input).subtotal()
    }

    /// Computes the full breakdown.
    ///
    /// ## Example
    /// ```rust
    /// use estamp_core::money::Money;
    /// use estamp_core::pricing::{PricingCalculator, PricingInput};
    /// use estamp_core::types::ServiceType;
    ///
    /// let calc = PricingCalculator::default();
    /// let price = calc.breakdown(&PricingInput {
    ///     stamp_amount: Money::from_paise(10100),
    ///     convenience_fee: Money::from_paise(7697),
    ///     service_type: ServiceType::Express,
    ///     doorstep_delivery: false,
    ///     discount: Money::zero(),
    /// });
    /// assert_eq!(price.total.paise(), 27797);
    /// ```
    pub fn breakdown(&self, input: &PricingInput) -> PriceBreakdown {
        let mut price = self.undiscounted(input);

        // Never discount into the stamp duty itself
        let max_discount = price.subtotal() - price.stamp_paper;
        let discount = input.discount.clamp_between(Money::zero(), max_discount);

        price.discount = discount;
        price.total = price.subtotal() - discount;
        price
    }

    fn undiscounted(&self, input: &PricingInput) -> PriceBreakdown {
        let doorstep_charge = if input.doorstep_delivery {
            self.doorstep_charge
        } else {
            Money::zero()
        };

        let mut price = PriceBreakdown {
            stamp_paper: input.stamp_amount,
            convenience_fee: input.convenience_fee,
            service_charge: input.service_type.surcharge(),
            doorstep_charge,
            discount: Money::zero(),
            total: Money::zero(),
        };
        price.total = price.subtotal();
        price
    }
}

impl Default for PricingCalculator {
    fn default() -> Self {
        PricingCalculator::new(DEFAULT_DOORSTEP_CHARGE)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(service_type: ServiceType, doorstep_delivery: bool, discount: i64) -> PricingInput {
        PricingInput {
            stamp_amount: Money::from_paise(10100),
            convenience_fee: Money::from_paise(7697),
            service_type,
            doorstep_delivery,
            discount: Money::from_paise(discount),
        }
    }

    #[test]
    fn test_express_without_promo() {
        let price = PricingCalculator::default().breakdown(&input(ServiceType::Express, false, 0));

        assert_eq!(
            price,
            PriceBreakdown {
                stamp_paper: Money::from_paise(10100),
                convenience_fee: Money::from_paise(7697),
                service_charge: Money::from_paise(10000),
                doorstep_charge: Money::zero(),
                discount: Money::zero(),
                total: Money::from_paise(27797),
            }
        );
    }

    #[test]
    fn test_standard_with_fixed_discount() {
        let calc = PricingCalculator::default();
        let i = input(ServiceType::Standard, false, 1500);

        assert_eq!(calc.subtotal(&i).paise(), 17797);

        let price = calc.breakdown(&i);
        assert_eq!(price.discount.paise(), 1500);
        assert_eq!(price.total.paise(), 16297);
    }

    #[test]
    fn test_doorstep_uses_configured_charge() {
        let calc = PricingCalculator::new(Money::from_paise(7500));
        let price = calc.breakdown(&input(ServiceType::Standard, true, 0));

        assert_eq!(price.doorstep_charge.paise(), 7500);
        assert_eq!(price.total.paise(), 10100 + 7697 + 7500);
    }

    #[test]
    fn test_discount_never_eats_into_stamp_paper() {
        let price = PricingCalculator::default().breakdown(&input(ServiceType::Standard, false, 1_000_000));

        assert_eq!(price.discount.paise(), 7697);
        assert_eq!(price.total, price.stamp_paper);
    }

    #[test]
    fn test_negative_discount_is_ignored() {
        let price = PricingCalculator::default().breakdown(&input(ServiceType::Standard, false, -300));
        assert_eq!(price.discount, Money::zero());
        assert_eq!(price.total.paise(), 17797);
    }

    #[test]
    fn test_identity_holds_for_all_combinations() {
        let calc = PricingCalculator::default();

        for service_type in [ServiceType::Standard, ServiceType::Express] {
            for doorstep in [false, true] {
                for discount in [0, 1, 1500, 7697, 17697, 50000, i64::from(u32::MAX)] {
                    let p = calc.breakdown(&input(service_type, doorstep, discount));

                    assert_eq!(
                        p.total,
                        p.stamp_paper + p.convenience_fee + p.service_charge + p.doorstep_charge
                            - p.discount
                    );
                    assert!(p.total >= p.stamp_paper);
                    assert!(!p.discount.is_negative());
                }
            }
        }
    }
}
