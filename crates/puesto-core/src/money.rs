//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004                │
//! │                                                                     │
//! │  A register that adds dozens of small sales per day accumulates     │
//! │  that drift into real centavos. We store integer cents instead:     │
//! │  every stored monetary field is an exact i64 cent count, and the    │
//! │  single place precision can be lost (division) rounds explicitly.   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use puesto_core::money::Money;
//!
//! let price = Money::from_cents(1050); // $10.50
//! let line = price * 3;                // $31.50
//!
//! // Batch costing divides; div_round is the one rounding point.
//! let unit_cost = Money::from_cents(12600).div_round(18); // $7.00
//! assert_eq!(unit_cost.cents(), 700);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: reconciliation variances can be negative
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type: batch costs,
/// weighted-average inventory costs, sale revenue, customer balances, and
/// the daily cash register totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use puesto_core::money::Money;
    ///
    /// let price = Money::from_cents(1050); // $10.50
    /// assert_eq!(price.cents(), 1050);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of two values.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Divides by an integer count, rounding to the nearest cent.
    ///
    /// Halves round up, matching `round(x * 100) / 100` on the fractional
    /// reading of the same amount. This is the only operation in the system
    /// that can lose precision; multiplication in cents space is exact.
    ///
    /// ## Example
    /// ```rust
    /// use puesto_core::money::Money;
    ///
    /// // $226.00 worth of stock over 38 units -> $5.95 per unit
    /// let avg = Money::from_cents(22600).div_round(38);
    /// assert_eq!(avg.cents(), 595);
    /// ```
    ///
    /// `divisor` must be positive; costing validates counts before dividing.
    pub fn div_round(&self, divisor: i64) -> Money {
        debug_assert!(divisor > 0, "div_round requires a positive divisor");
        let n = self.0 as i128;
        let d = divisor as i128;
        // floor((2n + d) / 2d): nearest integer, halves toward +infinity.
        // i128 interior keeps the doubling safe for any i64 amount.
        let q = (2 * n + d).div_euclid(2 * d);
        Money(q as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use puesto_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000); // $10.00
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 3000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for logs and debugging. The frontend formats for locale display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.pesos().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing is used for inventory valuation and outstanding-debt totals.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.pesos(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_pesos() {
        assert_eq!(Money::from_pesos(10).cents(), 1000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_div_round_exact() {
        // $100.00 over 20 units -> $5.00, no rounding needed
        assert_eq!(Money::from_cents(10000).div_round(20).cents(), 500);
    }

    #[test]
    fn test_div_round_nearest() {
        // $226.00 over 38 units = 594.7 cents -> 595
        assert_eq!(Money::from_cents(22600).div_round(38).cents(), 595);
        // 100 over 3 = 33.3 cents -> 33
        assert_eq!(Money::from_cents(100).div_round(3).cents(), 33);
    }

    #[test]
    fn test_div_round_half_up() {
        // 5 / 2 = 2.5 -> 3
        assert_eq!(Money::from_cents(5).div_round(2).cents(), 3);
        // negative halves also move toward +infinity: -2.5 -> -2
        assert_eq!(Money::from_cents(-5).div_round(2).cents(), -2);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }

    #[test]
    fn test_max() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(-40);
        assert_eq!(a.max(b), a);
        assert_eq!(b.max(Money::zero()), Money::zero());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 400);
    }
}
