//! # Discount Calculator
//!
//! Item-level then sale-level discounts with floor-at-zero rules.
//!
//! ## Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line i:   gross_i = unit_i × qty_i                                     │
//! │            final_i = max(0, gross_i − item_discount_i(gross_i))         │
//! │                                                                         │
//! │  sale:     subtotal = Σ final_i                                         │
//! │            total    = max(0, subtotal − sale_discount(subtotal))        │
//! │                                                                         │
//! │  percentage(x) = round_half_up(x × bps / 10000)                         │
//! │  amount(x)     = the literal amount (never scaled by quantity)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount type is a closed set. Strings only exist at the request
//! boundary, where [`Discount::parse`] rejects anything but `none`,
//! `percentage` and `amount`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::validate_price_cents;

/// 100% in basis points.
pub const MAX_DISCOUNT_BPS: i64 = 10_000;

// =============================================================================
// Discount Rate
// =============================================================================

/// A percentage expressed in basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Stored tag of a discount (`discount_type` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    None,
    Percentage,
    Amount,
}

impl Default for DiscountKind {
    fn default() -> Self {
        DiscountKind::None
    }
}

/// A discount applied to a line or to a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    None,
    Percentage(DiscountRate),
    Amount(Money),
}

impl Default for Discount {
    fn default() -> Self {
        Discount::None
    }
}

impl Discount {
    pub const ALLOWED: &'static [&'static str] = &["none", "percentage", "amount"];

    /// Parses a discount from its request representation.
    ///
    /// ## Rules
    /// - missing type or `none` → no discount (value ignored)
    /// - `percentage` → value in basis points, 0..=10000
    /// - `amount` → value in cents, 0..=`MAX_MONEY_CENTS`
    /// - anything else → `NotAllowed`
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::discount::{Discount, DiscountRate};
    ///
    /// let d = Discount::parse(Some("percentage"), Some(1000), "discount").unwrap();
    /// assert_eq!(d, Discount::Percentage(DiscountRate::from_bps(1000)));
    /// assert!(Discount::parse(Some("bogo"), Some(1), "discount").is_err());
    /// ```
    pub fn parse(
        kind: Option<&str>,
        value: Option<i64>,
        field: &str,
    ) -> Result<Discount, ValidationError> {
        let kind = kind.map(|k| k.trim().to_ascii_lowercase());
        let value_field = format!("{}_value", field);

        match kind.as_deref() {
            None | Some("") | Some("none") => Ok(Discount::None),
            Some("percentage") => {
                let bps = value.ok_or_else(|| ValidationError::required(&value_field))?;
                if !(0..=MAX_DISCOUNT_BPS).contains(&bps) {
                    return Err(ValidationError::OutOfRange {
                        field: value_field,
                        min: 0,
                        max: MAX_DISCOUNT_BPS,
                    });
                }
                Ok(Discount::Percentage(DiscountRate::from_bps(bps as u32)))
            }
            Some("amount") => {
                let cents = value.ok_or_else(|| ValidationError::required(&value_field))?;
                validate_price_cents(&value_field, cents)?;
                Ok(Discount::Amount(Money::from_cents(cents)))
            }
            Some(_) => Err(ValidationError::not_allowed(
                format!("{}_type", field),
                Discount::ALLOWED,
            )),
        }
    }

    /// Rebuilds a discount from its stored columns.
    pub fn from_parts(kind: DiscountKind, value: i64) -> Discount {
        match kind {
            DiscountKind::None => Discount::None,
            DiscountKind::Percentage => {
                Discount::Percentage(DiscountRate::from_bps(value.clamp(0, MAX_DISCOUNT_BPS) as u32))
            }
            DiscountKind::Amount => Discount::Amount(Money::from_cents(value.max(0))),
        }
    }

    /// Splits into the stored `(discount_type, discount_value)` columns.
    pub fn to_parts(&self) -> (DiscountKind, i64) {
        match self {
            Discount::None => (DiscountKind::None, 0),
            Discount::Percentage(rate) => (DiscountKind::Percentage, rate.bps() as i64),
            Discount::Amount(amount) => (DiscountKind::Amount, amount.cents()),
        }
    }

    /// Raw discount on `base`, before flooring.
    pub fn amount_on(&self, base: Money) -> Money {
        match self {
            Discount::None => Money::zero(),
            Discount::Percentage(rate) => base.percentage(*rate),
            Discount::Amount(amount) => *amount,
        }
    }

    /// Applies the discount to `base`.
    ///
    /// Returns `(effective_discount, result)` where `result` is floored at
    /// zero and `effective_discount = base − result`.
    pub fn apply(&self, base: Money) -> (Money, Money) {
        let result = base.saturating_discount(self.amount_on(base));
        (base - result, result)
    }
}

// =============================================================================
// Line & Sale Totals
// =============================================================================

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineTotals {
    pub gross: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
}

/// Computed amounts for a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

/// Stateless calculator for the discount cascade.
pub struct DiscountCalculator;

impl DiscountCalculator {
    /// Computes one line: `gross = unit × qty`, item discount on gross.
    ///
    /// Fails with `OutOfRange` when the gross amount does not fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::discount::{Discount, DiscountCalculator, DiscountRate};
    /// use tally_core::money::Money;
    ///
    /// let line = DiscountCalculator::line(
    ///     Money::from_cents(10000),
    ///     2,
    ///     Discount::Percentage(DiscountRate::from_bps(1000)),
    /// )
    /// .unwrap();
    /// assert_eq!(line.gross.cents(), 20000);
    /// assert_eq!(line.discount_amount.cents(), 2000);
    /// assert_eq!(line.final_amount.cents(), 18000);
    /// ```
    pub fn line(unit_price: Money, quantity: i64, discount: Discount) -> Result<LineTotals, ValidationError> {
        let gross = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "line_amount_cents".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        let (discount_amount, final_amount) = discount.apply(gross);
        Ok(LineTotals {
            gross,
            discount_amount,
            final_amount,
        })
    }

    /// Computes the sale totals from already-discounted lines.
    pub fn sale<'a>(
        lines: impl IntoIterator<Item = &'a LineTotals>,
        discount: Discount,
    ) -> SaleTotals {
        let subtotal: Money = lines.into_iter().map(|l| l.final_amount).sum();
        let (discount_amount, total) = discount.apply(subtotal);
        SaleTotals {
            subtotal,
            discount_amount,
            total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(bps: u32) -> Discount {
        Discount::Percentage(DiscountRate::from_bps(bps))
    }

    fn amount(cents: i64) -> Discount {
        Discount::Amount(Money::from_cents(cents))
    }

    #[test]
    fn test_parse_closed_set() {
        assert_eq!(Discount::parse(None, None, "discount").unwrap(), Discount::None);
        assert_eq!(
            Discount::parse(Some("none"), Some(500), "discount").unwrap(),
            Discount::None
        );
        assert_eq!(
            Discount::parse(Some("amount"), Some(500), "discount").unwrap(),
            amount(500)
        );
        assert!(matches!(
            Discount::parse(Some("fixed"), Some(500), "discount"),
            Err(ValidationError::NotAllowed { .. })
        ));
        assert!(matches!(
            Discount::parse(Some("percentage"), Some(10_001), "discount"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Discount::parse(Some("amount"), Some(-1), "discount"),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(matches!(
            Discount::parse(Some("percentage"), None, "discount"),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_parts_roundtrip_keeps_meaning() {
        for d in [Discount::None, pct(1250), amount(300)] {
            let (kind, value) = d.to_parts();
            assert_eq!(Discount::from_parts(kind, value), d);
        }
    }

    #[test]
    fn test_fixed_amount_not_scaled_by_quantity() {
        let line = DiscountCalculator::line(Money::from_cents(1000), 3, amount(500)).unwrap();
        assert_eq!(line.gross.cents(), 3000);
        assert_eq!(line.discount_amount.cents(), 500);
        assert_eq!(line.final_amount.cents(), 2500);
    }

    #[test]
    fn test_line_floor_at_zero() {
        let line = DiscountCalculator::line(Money::from_cents(1000), 1, amount(5000)).unwrap();
        assert_eq!(line.final_amount.cents(), 0);
        assert_eq!(line.discount_amount.cents(), 1000);
    }

    #[test]
    fn test_sale_discount_on_post_item_subtotal() {
        let lines = [
            DiscountCalculator::line(Money::from_cents(10000), 2, pct(1000)).unwrap(), // 18000
            DiscountCalculator::line(Money::from_cents(500), 4, amount(200)).unwrap(), // 1800
        ];
        let totals = DiscountCalculator::sale(&lines, pct(1000));
        assert_eq!(totals.subtotal.cents(), 19800);
        assert_eq!(totals.discount_amount.cents(), 1980);
        assert_eq!(totals.total.cents(), 17820);
    }

    #[test]
    fn test_sale_total_floor_at_zero() {
        let lines = [DiscountCalculator::line(Money::from_cents(700), 1, Discount::None).unwrap()];
        let totals = DiscountCalculator::sale(&lines, amount(1000));
        assert_eq!(totals.total.cents(), 0);
        assert_eq!(totals.discount_amount.cents(), 700);
    }

    /// total == max(0, Σ max(0, g_i − d_i) − D) across a grid of inputs.
    #[test]
    fn test_cascade_formula_holds() {
        let grosses = [0_i64, 1, 999, 5000, 12345];
        let item_discounts = [Discount::None, pct(0), pct(3333), pct(10000), amount(1), amount(6000)];
        let sale_discounts = [Discount::None, pct(1500), pct(10000), amount(250), amount(1_000_000)];

        for sale_discount in sale_discounts {
            let mut lines = Vec::new();
            let mut expected_subtotal = 0_i64;
            for (i, g) in grosses.iter().enumerate() {
                let d = item_discounts[i % item_discounts.len()];
                let line = DiscountCalculator::line(Money::from_cents(*g), 1, d).unwrap();
                let raw = d.amount_on(Money::from_cents(*g)).cents();
                expected_subtotal += (g - raw).max(0);
                lines.push(line);
            }
            let totals = DiscountCalculator::sale(&lines, sale_discount);
            let raw_sale = sale_discount.amount_on(Money::from_cents(expected_subtotal)).cents();
            assert_eq!(totals.subtotal.cents(), expected_subtotal);
            assert_eq!(totals.total.cents(), (expected_subtotal - raw_sale).max(0));
        }
    }

    #[test]
    fn test_line_overflow_is_rejected() {
        let err = DiscountCalculator::line(Money::from_cents(i64::MAX / 2), 3, Discount::None).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let ceiling = Money::from_cents(crate::MAX_MONEY_CENTS);
        assert!(DiscountCalculator::line(ceiling, crate::MAX_ITEM_QUANTITY, Discount::None).is_ok());
    }

    #[test]
    fn test_amount_discount_is_bounded() {
        assert!(Discount::parse(Some("amount"), Some(crate::MAX_MONEY_CENTS), "discount").is_ok());
        assert!(Discount::parse(Some("amount"), Some(i64::MAX), "discount").is_err());
        assert!(Discount::parse(Some("amount"), Some(-1), "discount").is_err());
    }
}
