//! # Price Oracle
//!
//! Resolves the authoritative unit price for a product at the moment of sale.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer_type = retail     ──► product.retail_price                    │
//! │  customer_type = long-term  ──► product.wholesale_price                 │
//! │                                   └── unset? ──► product.retail_price   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client also submits a unit price. It is checked, never trusted: a
//! difference above [`PRICE_TOLERANCE`] fails the sale with `PriceMismatch`
//! instead of silently substituting the right price.

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, PRICE_TOLERANCE};
use crate::types::{CustomerType, Product};

pub struct PriceOracle;

impl PriceOracle {
    /// Resolves the unit price for `product` under `customer_type`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let price = PriceOracle::resolve(&product, CustomerType::LongTerm);
    /// ```
    pub fn resolve(product: &Product, customer_type: CustomerType) -> Money {
        match customer_type {
            CustomerType::Retail => product.retail_price(),
            CustomerType::LongTerm => product
                .wholesale_price()
                .unwrap_or_else(|| product.retail_price()),
        }
    }

    /// Resolves the price and checks the submitted one against it.
    ///
    /// ## Returns
    /// * `Ok(resolved)` - the oracle price (what gets persisted)
    /// * `Err(PriceMismatch)` - submitted price outside tolerance
    pub fn verify(
        product: &Product,
        customer_type: CustomerType,
        submitted: Money,
    ) -> CoreResult<Money> {
        let expected = Self::resolve(product, customer_type);

        if !submitted.within(expected, PRICE_TOLERANCE) {
            return Err(CoreError::PriceMismatch {
                product_id: product.id.clone(),
                submitted,
                expected,
            });
        }

        Ok(expected)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
