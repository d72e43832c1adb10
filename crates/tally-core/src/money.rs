//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Client submits 100.00 × 3 with 10% off:                                │
//! │    300.0 * 0.9 = 270.00000000000006  ❌ Total mismatch!                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    30000 cents - (30000 × 1000 + 5000) / 10000 = 27000 cents            │
//! │    Client and server agree to the cent, and the only slack we allow    │
//! │    is the explicit PRICE_TOLERANCE of one cent.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(10000); // 100.00
//! let gross = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(gross.cents(), 20000);
//!
//! // Discounts never push a line below zero
//! let line = gross.saturating_discount(Money::from_cents(25000));
//! assert!(line.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::discount::DiscountRate;

/// Maximum absolute difference accepted between a client-submitted amount and
/// the server-computed one (0.01 currency units).
pub const PRICE_TOLERANCE: Money = Money::from_cents(1);

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Ledger balances go negative (credit side)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.retail_price ──► PriceOracle ──► SaleItem.unit_price           │
/// │                                               │                         │
/// │                      gross = unit × qty ◄─────┘                         │
/// │                            │                                            │
/// │              item discount ▼  (floored at zero)                         │
/// │                      final line ──► Σ subtotal ──► sale discount        │
/// │                                                        │                │
/// │                                   Sale.total_amount ◄──┘                │
/// │                                          │                              │
/// │                                          ▼                              │
/// │                              BalanceLedger debit entry                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity; `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_multiply_quantity(3).map(|m| m.cents()), Some(897));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `rate` of this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. i128 prevents overflow
    /// on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::discount::DiscountRate;
    /// use tally_core::money::Money;
    ///
    /// let gross = Money::from_cents(20000);
    /// let off = gross.percentage(DiscountRate::from_bps(1000)); // 10%
    /// assert_eq!(off.cents(), 2000);
    /// ```
    pub fn percentage(&self, rate: DiscountRate) -> Money {
        let amount = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(amount as i64)
    }

    /// Subtracts a discount, flooring the result at zero.
    ///
    /// A discount may never invert an amount into negative revenue.
    #[inline]
    pub fn saturating_discount(&self, discount: Money) -> Money {
        Money(self.0.saturating_sub(discount.0).max(0))
    }

    /// Checks whether two amounts agree within `tolerance` (inclusive).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, PRICE_TOLERANCE};
    ///
    /// let expected = Money::from_cents(10000);
    /// assert!(Money::from_cents(10001).within(expected, PRICE_TOLERANCE));
    /// assert!(!Money::from_cents(10002).within(expected, PRICE_TOLERANCE));
    /// ```
    #[inline]
    pub fn within(&self, other: Money, tolerance: Money) -> bool {
        self.0.abs_diff(other.0) <= tolerance.0.unsigned_abs()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`-5.50`); currency symbols belong to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
