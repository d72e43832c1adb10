//! # Transaction Snapshotter
//!
//! Freezes product facts into sale lines at commit time.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product (mutable)                 SaleItem (frozen)                    │
//! │  ─────────────────                 ─────────────────                    │
//! │  name "Cement 50kg"   ──copy──►    product_name "Cement 50kg"           │
//! │  brand, category      ──copy──►    brand, category                      │
//! │  unit_of_measure      ──copy──►    unit_of_measure                      │
//! │  price (via oracle)   ──copy──►    unit_price_cents                     │
//! │                                                                         │
//! │  Later: product renamed / repriced / deleted                           │
//! │         SaleItem unchanged. Reads never re-derive from Product.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Comparing a frozen line with the current product is informational only
//! ([`ItemDrift`]); it never feeds back into the stored fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::discount::{Discount, DiscountCalculator, LineTotals};
use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::PriceOracle;
use crate::types::{CustomerType, Product, SaleItem};

/// Copies the product's current facts and the resolved price into a new line.
pub fn freeze(
    sale_id: &str,
    product: &Product,
    unit_price: Money,
    quantity: i64,
    discount: Discount,
    now: DateTime<Utc>,
) -> Result<SaleItem, ValidationError> {
    let totals = DiscountCalculator::line(unit_price, quantity, discount)?;
    let (discount_type, discount_value) = discount.to_parts();

    Ok(SaleItem {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        product_id: Some(product.id.clone()),
        product_name: product.name.clone(),
        brand: product.brand.clone(),
        category: product.category.clone(),
        unit_of_measure: product.unit_of_measure.clone(),
        unit_price_cents: unit_price.cents(),
        quantity,
        original_price_cents: totals.gross.cents(),
        discount_type,
        discount_value,
        discount_amount_cents: totals.discount_amount.cents(),
        final_price_cents: totals.final_amount.cents(),
        created_at: now,
    })
}

/// Recomputes a frozen line for a new quantity and/or discount.
///
/// The unit price stays the frozen one; only the edit path calls this.
pub fn reprice(item: &SaleItem, quantity: i64, discount: Discount) -> Result<SaleItem, ValidationError> {
    let totals = DiscountCalculator::line(item.unit_price(), quantity, discount)?;
    let (discount_type, discount_value) = discount.to_parts();

    Ok(SaleItem {
        quantity,
        original_price_cents: totals.gross.cents(),
        discount_type,
        discount_value,
        discount_amount_cents: totals.discount_amount.cents(),
        final_price_cents: totals.final_amount.cents(),
        ..item.clone()
    })
}

/// Line totals as stored on a frozen item.
pub fn stored_totals(item: &SaleItem) -> LineTotals {
    LineTotals {
        gross: Money::from_cents(item.original_price_cents),
        discount_amount: Money::from_cents(item.discount_amount_cents),
        final_amount: Money::from_cents(item.final_price_cents),
    }
}

// =============================================================================
// Drift (informational comparison)
// =============================================================================

/// How the live product differs from a frozen sale line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemDrift {
    /// Product was soft-deleted or purged since the sale.
    pub product_deleted: bool,
    /// Current oracle price differs from the frozen unit price.
    pub price_changed: bool,
    /// Product name differs from the frozen name.
    pub renamed: bool,
    /// Current resolved price, when the product still exists.
    pub current_price_cents: Option<i64>,
}

/// Compares a frozen line with the current product state.
pub fn drift(item: &SaleItem, current: Option<&Product>, customer_type: CustomerType) -> ItemDrift {
    match current {
        None => ItemDrift {
            product_deleted: true,
            ..ItemDrift::default()
        },
        Some(product) => {
            let current_price = PriceOracle::resolve(product, customer_type);
            ItemDrift {
                product_deleted: product.is_deleted(),
                price_changed: current_price.cents() != item.unit_price_cents,
                renamed: product.name != item.product_name,
                current_price_cents: Some(current_price.cents()),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountRate;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Paint 4L".to_string(),
            brand: Some("Berger".to_string()),
            category: Some("Paint".to_string()),
            unit_of_measure: "tin".to_string(),
            retail_price_cents: 10000,
            wholesale_price_cents: Some(8000),
            cost_price_cents: Some(6000),
            stock_quantity: 5,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_freeze_copies_product_facts() {
        let p = product();
        let item = freeze(
            "s-1",
            &p,
            Money::from_cents(10000),
            2,
            Discount::Percentage(DiscountRate::from_bps(1000)),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(item.product_id.as_deref(), Some("p-1"));
        assert_eq!(item.product_name, "Paint 4L");
        assert_eq!(item.brand.as_deref(), Some("Berger"));
        assert_eq!(item.unit_of_measure, "tin");
        assert_eq!(item.unit_price_cents, 10000);
        assert_eq!(item.original_price_cents, 20000);
        assert_eq!(item.discount_amount_cents, 2000);
        assert_eq!(item.final_price_cents, 18000);
    }

    #[test]
    fn test_frozen_item_independent_of_product_edits() {
        let mut p = product();
        let item = freeze("s-1", &p, p.retail_price(), 1, Discount::None, Utc::now()).unwrap();

        p.name = "Paint 4L (new label)".to_string();
        p.retail_price_cents = 12000;
        p.brand = None;

        assert_eq!(item.product_name, "Paint 4L");
        assert_eq!(item.unit_price_cents, 10000);
        assert_eq!(item.brand.as_deref(), Some("Berger"));

        let d = drift(&item, Some(&p), CustomerType::Retail);
        assert!(d.price_changed);
        assert!(d.renamed);
        assert!(!d.product_deleted);
        assert_eq!(d.current_price_cents, Some(12000));
    }

    #[test]
    fn test_drift_for_missing_product() {
        let p = product();
        let item = freeze("s-1", &p, p.retail_price(), 1, Discount::None, Utc::now()).unwrap();
        let d = drift(&item, None, CustomerType::Retail);
        assert!(d.product_deleted);
        assert_eq!(d.current_price_cents, None);
    }

    #[test]
    fn test_reprice_keeps_frozen_price() {
        let p = product();
        let item = freeze("s-1", &p, Money::from_cents(8000), 1, Discount::None, Utc::now()).unwrap();
        let edited = reprice(&item, 3, Discount::Amount(Money::from_cents(1000))).unwrap();

        assert_eq!(edited.id, item.id);
        assert_eq!(edited.unit_price_cents, 8000);
        assert_eq!(edited.original_price_cents, 24000);
        assert_eq!(edited.final_price_cents, 23000);
    }
}
