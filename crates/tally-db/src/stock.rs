//! # Stock Ledger
//!
//! The only path that moves `products.stock_quantity` for sales.
//!
//! ## Reserve
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve(tx, product, qty)                                              │
//! │       │                                                                 │
//! │       ├── qty < 1 ?                      → ValidationError              │
//! │       ├── product missing / deleted ?    → NotFound                     │
//! │       ├── stock == 0 ?                   → OutOfStock                   │
//! │       ├── stock < qty ?                  → InsufficientStock            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock - qty                               │
//! │   WHERE id = ? AND stock >= qty AND deleted_at IS NULL                 │
//! │       │                                                                 │
//! │       └── 0 rows? → re-read, report InsufficientStock / OutOfStock     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE is the authoritative check; the read before it only
//! produces a precise error. Everything runs on the caller's connection, so
//! the decrement commits or rolls back with the sale.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_quantity;
use tally_core::{CoreError, ValidationError};

/// Stock movements inside a caller-owned transaction.
pub struct StockLedger;

impl StockLedger {
    /// Decrements stock by `quantity`, or fails without writing.
    ///
    /// ## Returns
    /// The stock left after the decrement.
    pub async fn reserve(conn: &mut SqliteConnection, product_id: &str, quantity: i64) -> DbResult<i64> {
        // Aggregated lines may exceed the per-line maximum; only the sign matters here.
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let available = Self::available(conn, product_id).await?;
        Self::check(product_id, available, quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND stock_quantity >= ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race between the read and the guarded write.
            let available = Self::available(conn, product_id).await?;
            warn!(product_id, available, requested = quantity, "Guarded stock decrement matched no row");
            Self::check(product_id, available, quantity)?;
            return Err(DbError::TransactionFailed(format!(
                "stock for product {} changed concurrently",
                product_id
            )));
        }

        let remaining = available - quantity;
        debug!(product_id, quantity, remaining, "Stock reserved");
        Ok(remaining)
    }

    /// Increments stock by `quantity`; the exact inverse of [`reserve`].
    ///
    /// Succeeds on soft-deleted products so archived stock stays accurate.
    ///
    /// [`reserve`]: StockLedger::reserve
    pub async fn restore(conn: &mut SqliteConnection, product_id: &str, quantity: i64) -> DbResult<i64> {
        if quantity <= 0 {
            return Ok(Self::current(conn, product_id).await?);
        }

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        let stock = Self::current(conn, product_id).await?;
        debug!(product_id, quantity, stock, "Stock restored");
        Ok(stock)
    }

    /// Moves a line from `old_qty` to `new_qty`.
    ///
    /// Growing a line restores the old quantity and reserves the new one, so
    /// the availability check sees the line's own units as free. Shrinking
    /// only returns the difference and never needs the product to be active.
    pub async fn apply_delta(
        conn: &mut SqliteConnection,
        product_id: &str,
        old_qty: i64,
        new_qty: i64,
    ) -> DbResult<()> {
        validate_quantity(new_qty)?;

        if new_qty > old_qty {
            Self::restore(conn, product_id, old_qty).await?;
            Self::reserve(conn, product_id, new_qty).await?;
        } else if new_qty < old_qty {
            Self::restore(conn, product_id, old_qty - new_qty).await?;
        }
        Ok(())
    }

    /// Stock of an active product, or `NotFound`.
    async fn available(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar(
            "SELECT stock_quantity FROM products WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        stock.ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Stock of any product row, or `NotFound`.
    async fn current(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", product_id))
    }

    fn check(product_id: &str, available: i64, requested: i64) -> Result<(), CoreError> {
        if available <= 0 {
            return Err(CoreError::OutOfStock {
                product_id: product_id.to_string(),
                requested,
            });
        }
        if available < requested {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
