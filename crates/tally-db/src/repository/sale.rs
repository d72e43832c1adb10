//! # Sale Repository
//!
//! Row-level access to sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT (SaleEngine::create_sale, one transaction)                  │
//! │     └── insert_sale() + insert_item() × n + stock decrements           │
//! │                                                                         │
//! │  2. EDIT (SaleEngine::update_sale, one transaction)                    │
//! │     └── update_item() × n + update_sale() + stock deltas               │
//! │         customer_type never changes                                    │
//! │                                                                         │
//! │  3. SOFT DELETE / RESTORE / PURGE (SoftDeleteArchive)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write functions take a connection so they always run inside the
//! caller's transaction; the repository itself only reads.

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, customer_type, customer_id, subtotal_cents, discount_type, \
     discount_value, discount_amount_cents, total_amount_cents, created_at, updated_at, deleted_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, brand, category, \
     unit_of_measure, unit_price_cents, quantity, original_price_cents, discount_type, \
     discount_value, discount_amount_cents, final_price_cents, created_at";

// =============================================================================
// Reads
// =============================================================================

/// Fetches a sale regardless of its soft-delete state.
pub(crate) async fn fetch_sale<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    Ok(sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

/// Fetches an active sale or fails with `NotFound`.
pub(crate) async fn fetch_active_sale<'e, E>(executor: E, id: &str) -> DbResult<Sale>
where
    E: Executor<'e, Database = Sqlite>,
{
    match fetch_sale(executor, id).await? {
        Some(sale) if sale.deleted_at.is_none() => Ok(sale),
        _ => Err(DbError::not_found("Sale", id)),
    }
}

/// Items of a sale in insertion order.
pub(crate) async fn fetch_items<'e, E>(executor: E, sale_id: &str) -> DbResult<Vec<SaleItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid",
        ITEM_COLUMNS
    );
    Ok(sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(executor)
        .await?)
}

// =============================================================================
// Writes (transaction-scoped)
// =============================================================================

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, customer_type = %sale.customer_type, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, customer_type, customer_id, subtotal_cents,
            discount_type, discount_value, discount_amount_cents, total_amount_cents,
            created_at, updated_at, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.customer_type)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_type)
    .bind(sale.discount_value)
    .bind(sale.discount_amount_cents)
    .bind(sale.total_amount_cents)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a frozen sale line.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    debug!(sale_id = %item.sale_id, product = %item.product_name, qty = item.quantity, "Adding sale item");

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_name, brand, category, unit_of_measure,
            unit_price_cents, quantity, original_price_cents,
            discount_type, discount_value, discount_amount_cents, final_price_cents,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.brand)
    .bind(&item.category)
    .bind(&item.unit_of_measure)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.original_price_cents)
    .bind(item.discount_type)
    .bind(item.discount_value)
    .bind(item.discount_amount_cents)
    .bind(item.final_price_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Rewrites the editable columns of a line: quantity and discount amounts.
///
/// Frozen descriptive columns and the unit price are never touched.
pub(crate) async fn update_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sale_items SET
            quantity = ?2,
            original_price_cents = ?3,
            discount_type = ?4,
            discount_value = ?5,
            discount_amount_cents = ?6,
            final_price_cents = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&item.id)
    .bind(item.quantity)
    .bind(item.original_price_cents)
    .bind(item.discount_type)
    .bind(item.discount_value)
    .bind(item.discount_amount_cents)
    .bind(item.final_price_cents)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("SaleItem", &item.id));
    }
    Ok(())
}

/// Rewrites the editable columns of a sale.
///
/// `customer_type` is not in the SET list; a schema trigger rejects it too.
pub(crate) async fn update_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales SET
            customer_id = ?2,
            subtotal_cents = ?3,
            discount_type = ?4,
            discount_value = ?5,
            discount_amount_cents = ?6,
            total_amount_cents = ?7,
            updated_at = ?8
        WHERE id = ?1 AND deleted_at IS NULL
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_type)
    .bind(sale.discount_value)
    .bind(sale.discount_amount_cents)
    .bind(sale.total_amount_cents)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", &sale.id));
    }
    Ok(())
}

// =============================================================================
// Repository (reads)
// =============================================================================

/// Read-only repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets an active sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        Ok(fetch_sale(&self.pool, id)
            .await?
            .filter(|s| s.deleted_at.is_none()))
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        fetch_items(&self.pool, sale_id).await
    }

    /// Active sales, newest first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE deleted_at IS NULL ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            SALE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Number of sale rows in any state (diagnostics and tests).
    pub async fn count_all(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Number of sale item rows in any state.
    pub async fn count_items(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(&self.pool)
            .await?)
    }
}
