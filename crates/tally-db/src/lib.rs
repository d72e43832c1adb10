//! # tally-db: Database Layer for Tally
//!
//! SQLite storage through sqlx, plus every operation that needs a
//! transaction boundary: the sale engine, the stock ledger and the
//! soft-delete archive.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tally-server handler                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   SaleEngine ──► StockLedger        SoftDeleteArchive          │   │
//! │  │       │                                   │                     │   │
//! │  │       ▼                                   ▼                     │   │
//! │  │   Repositories  ◄──────────────────  PasswordGate              │   │
//! │  │       │                                                         │   │
//! │  │   Database (pool.rs) + embedded migrations                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`stock`] - Guarded stock decrements and restores
//! - [`engine`] - Sale create/edit/history
//! - [`archive`] - Soft delete, restore, purge
//! - [`auth`] - Argon2 owner password gate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let receipt = db.engine().create_sale(request).await?;
//! let statement = db.ledger().customer_statement(&customer_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod archive;
pub mod auth;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use archive::{PasswordGate, SaleSnapshot, SoftDeleteArchive};
pub use auth::OwnerPasswordGate;
pub use engine::{SaleDetail, SaleEdit, SaleEngine, SaleReceipt, SaleRequest, SaleStage};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use stock::StockLedger;

// Repository re-exports for convenience
pub use repository::ledger::LedgerRepository;
pub use repository::party::{CustomerRepository, SupplierRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
