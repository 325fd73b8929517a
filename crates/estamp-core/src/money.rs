//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 20% promo on ₹177.97 as a float is ₹35.594000000000001              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    17797 paise × 20 / 100 = 3559 paise (floor)                          │
//! │    The remainder is dropped explicitly, never rounded up               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use estamp_core::money::Money;
//!
//! // Create from paise (preferred)
//! let stamp = Money::from_paise(10100); // ₹101.00
//!
//! // Arithmetic operations
//! let total = stamp + Money::from_paise(7697); // ₹177.97
//! assert_eq!(total.paise(), 17797);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction of a discount may go negative mid-calculation;
///   the pricing layer clamps before anything is persisted
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StampTemplate.base_price ──► PriceBreakdown.stamp_paper               │
/// │  StampTemplate.convenience_fee ──► PriceBreakdown.convenience_fee      │
/// │  ServiceType surcharge ──► PriceBreakdown.service_charge               │
/// │  PromoCode discount ──► PriceBreakdown.discount                        │
/// │                                                                         │
/// │  PriceBreakdown.total ──► Payment gateway order amount                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use estamp_core::money::Money;
    ///
    /// let fee = Money::from_paise(7697); // ₹76.97
    /// assert_eq!(fee.paise(), 7697);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use estamp_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(100).paise(), 10000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `percent`% of this amount, rounded down to the paisa.
    ///
    /// Rounding down means a percentage promo can never grant more than the
    /// advertised rate.
    ///
    /// ## Example
    /// ```rust
    /// use estamp_core::money::Money;
    ///
    /// let subtotal = Money::from_paise(17797);
    /// assert_eq!(subtotal.percentage(20).paise(), 3559); // 3559.4 → 3559
    /// ```
    pub fn percentage(&self, percent: u32) -> Money {
        // i128 so large subtotals cannot overflow the intermediate product
        let part = (self.0 as i128 * percent as i128) / 100;
        Money::from_paise(part as i64)
    }

    /// Addition that reports overflow instead of wrapping.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Subtraction that reports overflow instead of wrapping.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Clamps the value into `[min, max]`.
    #[inline]
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows rupees with two decimals, for logs and notifications.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(10150);
        assert_eq!(money.paise(), 10150);
        assert_eq!(money.rupees(), 101);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(27797)), "₹277.97");
        assert_eq!(format!("{}", Money::from_paise(500)), "₹5.00");
        assert_eq!(format!("{}", Money::from_paise(-1550)), "-₹15.50");
        assert_eq!(format!("{}", Money::zero()), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_paise(i64::MAX);

        assert_eq!(max.checked_add(Money::from_paise(1)), None);
        assert_eq!(Money::from_paise(i64::MIN).checked_sub(Money::from_paise(1)), None);
        assert_eq!(
            Money::from_paise(10100).checked_add(Money::from_paise(7697)),
            Some(Money::from_paise(17797))
        );
    }

    #[test]
    fn test_percentage_rounds_down() {
        assert_eq!(Money::from_paise(100000).percentage(20).paise(), 20000);
        assert_eq!(Money::from_paise(999).percentage(10).paise(), 99);
        assert_eq!(Money::from_paise(12345).percentage(0).paise(), 0);
        assert_eq!(Money::from_paise(12345).percentage(100).paise(), 12345);
    }

    #[test]
    fn test_clamp_between() {
        let lo = Money::zero();
        let hi = Money::from_paise(500);
        assert_eq!(Money::from_paise(-5).clamp_between(lo, hi), lo);
        assert_eq!(Money::from_paise(900).clamp_between(lo, hi), hi);
        assert_eq!(Money::from_paise(250).clamp_between(lo, hi).paise(), 250);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_paise(100).is_positive());
        assert!(Money::from_paise(-100).is_negative());
    }
}
