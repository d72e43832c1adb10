//! # Repository Module
//!
//! Row-level database access for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.products().list()                                           │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / SupplierRepository           │
//! │  SaleRepository (reads) / LedgerRepository / UserRepository            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories only expose "active" reads (`deleted_at IS NULL`). The
//! crate-private `fetch_*` helpers take any executor, so the sale engine and
//! the archive can run them inside their own transactions.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalogue create/read/update
//! - [`party::CustomerRepository`], [`party::SupplierRepository`] - Parties
//! - [`sale::SaleRepository`] - Sale and sale item reads
//! - [`ledger::LedgerRepository`] - Payments, purchases, statements
//! - [`user::UserRepository`] - Owner credentials

pub mod ledger;
pub mod party;
pub mod product;
pub mod sale;
pub mod user;
