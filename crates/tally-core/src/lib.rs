//! # tally-core: Pure Business Logic for Tally
//!
//! Everything the sale engine decides, expressed as pure functions with zero
//! I/O dependencies. The database crate supplies rows; this crate decides
//! prices, discounts, snapshots and balances.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-server (axum)                          │   │
//! │  │    /sales, /deleted-items, /customers/{id}/history, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db                                     │   │
//! │  │    SaleEngine, StockLedger, SoftDeleteArchive, repositories    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │ discount  │  │ snapshot  │  │  ledger   │  │   │
//! │  │   │  Oracle   │  │ cascade   │  │  freeze   │  │ running   │  │   │
//! │  │   │           │  │           │  │  drift    │  │ balance   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Customer, ...)
//! - [`money`] - Integer cents arithmetic
//! - [`pricing`] - PriceOracle
//! - [`discount`] - DiscountCalculator and the closed `Discount` variant
//! - [`snapshot`] - Frozen sale lines and drift comparison
//! - [`ledger`] - BalanceLedger running-balance fold
//! - [`error`] - Domain error types
//! - [`validation`] - Boundary validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::discount::{Discount, DiscountCalculator, DiscountRate};
//! use tally_core::money::Money;
//!
//! // Retail 100.00 × 2 with 10% off the line
//! let line = DiscountCalculator::line(
//!     Money::from_cents(10000),
//!     2,
//!     Discount::Percentage(DiscountRate::from_bps(1000)),
//! )
//! .unwrap();
//! let totals = DiscountCalculator::sale([&line], Discount::None);
//! assert_eq!(totals.total.cents(), 18000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{Discount, DiscountCalculator, DiscountKind, DiscountRate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, PRICE_TOLERANCE};
pub use pricing::PriceOracle;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Guards against typos (1000 instead of 10) reaching the stock ledger.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest amount, in cents, accepted for any price, balance or payment.
///
/// `MAX_MONEY_CENTS × MAX_ITEM_QUANTITY × MAX_SALE_ITEMS` stays inside `i64`.
pub const MAX_MONEY_CENTS: i64 = 1_000_000_000_000;
