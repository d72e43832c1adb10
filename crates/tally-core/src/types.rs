//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  retail price   │   │  customer_type  │   │  frozen name    │       │
//! │  │  wholesale price│   │  (immutable)    │   │  frozen price   │       │
//! │  │  stock_quantity │   │  totals         │   │  discounts      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ Customer        │   │ Payment         │   │ DeletedItem     │       │
//! │  │ Supplier        │   │ Purchase        │   │ (archive)       │       │
//! │  │ opening balance │   │ ledger events   │   │ JSON snapshot   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Soft Delete Marker
//! Every archivable entity carries a single `deleted_at` marker. Only the
//! archive sets or clears it; repositories expose "active" reads that filter
//! on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::discount::{Discount, DiscountKind};
use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Customer Type (pricing classification)
// =============================================================================

/// Pricing tier attached to a sale at creation time.
///
/// `long-term` customers buy at the wholesale price. The wire name
/// `wholesale` is accepted as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum CustomerType {
    #[serde(rename = "retail")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "retail"))]
    Retail,
    #[serde(rename = "long-term", alias = "wholesale")]
    #[ts(rename = "long-term")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "long-term"))]
    LongTerm,
}

impl CustomerType {
    pub const ALLOWED: &'static [&'static str] = &["retail", "long-term", "wholesale"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Retail => "retail",
            CustomerType::LongTerm => "long-term",
        }
    }

    /// Parses an optional classification from the request boundary.
    ///
    /// Missing or unrecognized values are validation failures.
    pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Err(ValidationError::required("customer_type")),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for CustomerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retail" => Ok(CustomerType::Retail),
            "long-term" | "long_term" | "wholesale" => Ok(CustomerType::LongTerm),
            _ => Err(ValidationError::not_allowed(
                "customer_type",
                CustomerType::ALLOWED,
            )),
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Balance polarity & party kinds
// =============================================================================

/// Polarity of an opening balance.
///
/// Debit is positive ("to receive"), credit is negative ("to pay").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BalanceType {
    Debit,
    Credit,
}

impl Default for BalanceType {
    fn default() -> Self {
        BalanceType::Debit
    }
}

impl BalanceType {
    /// Applies this polarity to an unsigned amount.
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            BalanceType::Debit => amount.abs(),
            BalanceType::Credit => Money::zero() - amount.abs(),
        }
    }

    /// Conventional statement label for a signed balance.
    pub fn label_for(balance: Money) -> &'static str {
        if balance.is_negative() {
            "Cr"
        } else {
            "Dr"
        }
    }
}

/// Which side of the business a ledger belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    Customer,
    Supplier,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Customer => "customer",
            PartyType::Supplier => "supplier",
        }
    }
}

/// Entity kinds the soft-delete archive can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Product,
    Customer,
    Supplier,
    Sale,
}

impl ItemType {
    pub const ALLOWED: &'static [&'static str] = &["product", "customer", "supplier", "sale"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Customer => "customer",
            ItemType::Supplier => "supplier",
            ItemType::Sale => "sale",
        }
    }

    /// Display name used in error messages ("Product not found: ...").
    pub fn entity_name(&self) -> &'static str {
        match self {
            ItemType::Product => "Product",
            ItemType::Customer => "Customer",
            ItemType::Supplier => "Supplier",
            ItemType::Sale => "Sale",
        }
    }
}

impl FromStr for ItemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(ItemType::Product),
            "customer" => Ok(ItemType::Customer),
            "supplier" => Ok(ItemType::Supplier),
            "sale" => Ok(ItemType::Sale),
            _ => Err(ValidationError::not_allowed("item_type", ItemType::ALLOWED)),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, frozen into sale lines at time of sale.
    pub name: String,

    pub brand: Option<String>,

    pub category: Option<String>,

    /// Unit of measure ("pcs", "kg", "box", ...).
    pub unit_of_measure: String,

    /// Price for retail customers, in cents.
    pub retail_price_cents: i64,

    /// Price for long-term customers. Falls back to retail when unset.
    pub wholesale_price_cents: Option<i64>,

    /// Cost in cents (for margin reporting).
    pub cost_price_cents: Option<i64>,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker, set only by the archive.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    #[inline]
    pub fn retail_price(&self) -> Money {
        Money::from_cents(self.retail_price_cents)
    }

    #[inline]
    pub fn wholesale_price(&self) -> Option<Money> {
        self.wholesale_price_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Customer / Supplier
// =============================================================================

/// A customer. Its balance is never stored; see [`crate::ledger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub classification: CustomerType,
    pub opening_balance_cents: i64,
    pub opening_balance_type: BalanceType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Opening balance signed by its polarity.
    pub fn opening_balance(&self) -> Money {
        self.opening_balance_type
            .signed(Money::from_cents(self.opening_balance_cents))
    }
}

/// A supplier. Same ledger shape as a customer, without a pricing tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub opening_balance_cents: i64,
    pub opening_balance_type: BalanceType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Supplier {
    pub fn opening_balance(&self) -> Money {
        self.opening_balance_type
            .signed(Money::from_cents(self.opening_balance_cents))
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
///
/// `customer_type` is fixed at creation; the edit path refuses to change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_type: CustomerType,
    /// `None` means walk-in.
    pub customer_id: Option<String>,
    /// Sum of final line amounts (after item discounts).
    pub subtotal_cents: i64,
    pub discount_type: DiscountKind,
    /// Basis points for percentage, cents for amount, 0 for none.
    pub discount_value: i64,
    pub discount_amount_cents: i64,
    pub total_amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn is_walk_in(&self) -> bool {
        self.customer_id.is_none()
    }

    /// Rebuilds the sale-level discount from its stored parts.
    pub fn discount(&self) -> Discount {
        Discount::from_parts(self.discount_type, self.discount_value)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Product facts are frozen at commit time; `product_id` is kept only for
/// traceability and is nulled if the product is purged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: String,
    /// Resolved unit price at time of sale.
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Gross line amount (unit × quantity).
    pub original_price_cents: i64,
    pub discount_type: DiscountKind,
    pub discount_value: i64,
    pub discount_amount_cents: i64,
    /// Line amount after the item discount, floored at zero.
    pub final_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn discount(&self) -> Discount {
        Discount::from_parts(self.discount_type, self.discount_value)
    }
}

// =============================================================================
// Ledger events: Payment, Purchase
// =============================================================================

/// Money received from a customer or paid to a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub party_type: PartyType,
    pub party_id: String,
    pub amount_cents: i64,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Goods bought from a supplier on account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub supplier_id: String,
    pub total_amount_cents: i64,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Archive
// =============================================================================

/// A soft-deleted entity's snapshot, held until restore or purge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DeletedItem {
    pub id: String,
    pub item_type: ItemType,
    pub original_id: String,
    /// Full JSON of the row at deletion time.
    pub snapshot: String,
    #[ts(as = "String")]
    pub deleted_at: DateTime<Utc>,
    pub restorable: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_type_parse() {
        assert_eq!(CustomerType::parse(Some("retail")).unwrap(), CustomerType::Retail);
        assert_eq!(
            CustomerType::parse(Some("long-term")).unwrap(),
            CustomerType::LongTerm
        );
        assert_eq!(
            CustomerType::parse(Some("Wholesale")).unwrap(),
            CustomerType::LongTerm
        );
        assert!(matches!(
            CustomerType::parse(None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            CustomerType::parse(Some("vip")),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_customer_type_serde_names() {
        let json = serde_json::to_string(&CustomerType::LongTerm).unwrap();
        assert_eq!(json, "\"long-term\"");
        let parsed: CustomerType = serde_json::from_str("\"wholesale\"").unwrap();
        assert_eq!(parsed, CustomerType::LongTerm);
    }

    #[test]
    fn test_customer_type_typescript_matches_wire_names() {
        let ts = CustomerType::inline();
        assert!(ts.contains("\"long-term\""), "{ts}");
        assert!(ts.contains("\"retail\""), "{ts}");
        assert!(!ts.contains("LongTerm"), "{ts}");
    }

    #[test]
    fn test_balance_type_signed() {
        let amount = Money::from_cents(5000);
        assert_eq!(BalanceType::Debit.signed(amount).cents(), 5000);
        assert_eq!(BalanceType::Credit.signed(amount).cents(), -5000);
        assert_eq!(BalanceType::label_for(Money::from_cents(-1)), "Cr");
        assert_eq!(BalanceType::label_for(Money::zero()), "Dr");
    }

    #[test]
    fn test_item_type_from_str() {
        assert_eq!("SALE".parse::<ItemType>().unwrap(), ItemType::Sale);
        assert!("invoice".parse::<ItemType>().is_err());
    }
}
