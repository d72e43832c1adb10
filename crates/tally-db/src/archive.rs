//! # Soft Delete Archive
//!
//! Password-gated soft delete, restore and purge of products, customers,
//! suppliers and sales.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  live row                                                               │
//! │     │ soft_delete   (JSON snapshot → deleted_items, deleted_at = now)  │
//! │     ▼                                                                   │
//! │  archived ──── restore ───► live row   (record removed)                │
//! │     │                                                                   │
//! │     └──────── purge ──────► gone       (row + record removed)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a sale returns its stock; restoring it reserves the stock again.
//! Every step of an operation shares one transaction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::aggregate_quantities;
use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::party::{fetch_active_customer, fetch_active_supplier};
use crate::repository::product::fetch_active_product;
use crate::repository::sale::{fetch_active_sale, fetch_items};
use crate::stock::StockLedger;
use tally_core::{CoreError, DeletedItem, ItemType, PartyType, Sale, SaleItem};

/// Confirms the owner password before a destructive operation.
#[async_trait]
pub trait PasswordGate: Send + Sync {
    /// `Ok(false)` means the password is wrong; `Err` means it could not be checked.
    async fn verify(&self, candidate: &str) -> DbResult<bool>;
}

/// Archived form of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

const RECORD_COLUMNS: &str = "id, item_type, original_id, snapshot, deleted_at, restorable";

fn table_for(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Product => "products",
        ItemType::Customer => "customers",
        ItemType::Supplier => "suppliers",
        ItemType::Sale => "sales",
    }
}

#[derive(Clone)]
pub struct SoftDeleteArchive {
    pool: SqlitePool,
    gate: Arc<dyn PasswordGate>,
}

impl fmt::Debug for SoftDeleteArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftDeleteArchive").finish_non_exhaustive()
    }
}

impl SoftDeleteArchive {
    pub fn new(pool: SqlitePool, gate: Arc<dyn PasswordGate>) -> Self {
        SoftDeleteArchive { pool, gate }
    }

    async fn authorize(&self, password: Option<&str>) -> DbResult<()> {
        let candidate = password
            .filter(|p| !p.trim().is_empty())
            .ok_or(CoreError::PasswordRequired)?;

        if !self.gate.verify(candidate).await? {
            warn!("Destructive operation refused: incorrect password");
            return Err(CoreError::IncorrectPassword.into());
        }
        Ok(())
    }

    // =========================================================================
    // Soft delete
    // =========================================================================

    /// Archives a live row and marks it deleted.
    ///
    /// ## Returns
    /// The archive record; its `id` is what restore and purge take.
    pub async fn soft_delete(
        &self,
        item_type: ItemType,
        id: &str,
        password: Option<&str>,
    ) -> DbResult<DeletedItem> {
        self.authorize(password).await?;

        let mut tx = begin_write(&self.pool).await?;
        let snapshot = match item_type {
            ItemType::Product => serde_json::to_string(&fetch_active_product(&mut *tx, id).await?)?,
            ItemType::Customer => serde_json::to_string(&fetch_active_customer(&mut *tx, id).await?)?,
            ItemType::Supplier => serde_json::to_string(&fetch_active_supplier(&mut *tx, id).await?)?,
            ItemType::Sale => {
                let sale = fetch_active_sale(&mut *tx, id).await?;
                let items = fetch_items(&mut *tx, id).await?;
                for (product_id, quantity) in aggregate_quantities(&items) {
                    StockLedger::restore(&mut tx, &product_id, quantity).await?;
                }
                serde_json::to_string(&SaleSnapshot { sale, items })?
            }
        };

        let now = Utc::now();
        let sql = format!(
            "UPDATE {} SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            table_for(item_type)
        );
        let result = sqlx::query(&sql).bind(id).bind(now).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(item_type.entity_name(), id));
        }

        let record = DeletedItem {
            id: Uuid::new_v4().to_string(),
            item_type,
            original_id: id.to_string(),
            snapshot,
            deleted_at: now,
            restorable: true,
        };
        sqlx::query(
            r#"
            INSERT INTO deleted_items (id, item_type, original_id, snapshot, deleted_at, restorable)
            VALUES (?1, ?2, ?3, ?4, ?5, 1)
            "#,
        )
        .bind(&record.id)
        .bind(record.item_type)
        .bind(&record.original_id)
        .bind(&record.snapshot)
        .bind(record.deleted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(archive_id = %record.id, item_type = %item_type, original_id = id, "Item soft-deleted");
        Ok(record)
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Brings an archived row back and removes its archive record.
    ///
    /// A record found to be blocked (row gone, or a live row now holds the
    /// same name) is flagged non-restorable and the flag is kept.
    pub async fn restore(&self, archive_id: &str, password: Option<&str>) -> DbResult<DeletedItem> {
        self.authorize(password).await?;

        let mut tx = begin_write(&self.pool).await?;
        let record = fetch_record(&mut tx, archive_id)
            .await?
            .ok_or_else(|| DbError::not_found("DeletedItem", archive_id))?;

        if !record.restorable {
            return Err(not_restorable(&record, "record is marked non-restorable"));
        }

        if let Some(reason) = restore_blocker(&mut tx, &record).await? {
            sqlx::query("UPDATE deleted_items SET restorable = 0 WHERE id = ?1")
                .bind(&record.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            warn!(archive_id, item_type = %record.item_type, reason, "Restore refused");
            return Err(not_restorable(&record, reason));
        }

        if record.item_type == ItemType::Sale {
            let items = fetch_items(&mut *tx, &record.original_id).await?;
            for (product_id, quantity) in aggregate_quantities(&items) {
                StockLedger::reserve(&mut tx, &product_id, quantity).await?;
            }
        }

        let sql = format!(
            "UPDATE {} SET deleted_at = NULL WHERE id = ?1",
            table_for(record.item_type)
        );
        sqlx::query(&sql).bind(&record.original_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM deleted_items WHERE id = ?1")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(archive_id, item_type = %record.item_type, original_id = %record.original_id, "Item restored");
        Ok(record)
    }

    // =========================================================================
    // Purge
    // =========================================================================

    /// Physically deletes the archived row and its record. Irreversible.
    pub async fn purge(&self, archive_id: &str, password: Option<&str>) -> DbResult<DeletedItem> {
        self.authorize(password).await?;

        let mut tx = begin_write(&self.pool).await?;
        let record = fetch_record(&mut tx, archive_id)
            .await?
            .ok_or_else(|| DbError::not_found("DeletedItem", archive_id))?;

        let party = match record.item_type {
            ItemType::Customer => Some(PartyType::Customer),
            ItemType::Supplier => Some(PartyType::Supplier),
            ItemType::Product | ItemType::Sale => None,
        };
        if let Some(party_type) = party {
            // payments have no foreign key to their party
            sqlx::query("DELETE FROM payments WHERE party_type = ?1 AND party_id = ?2")
                .bind(party_type)
                .bind(&record.original_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "DELETE FROM {} WHERE id = ?1 AND deleted_at IS NOT NULL",
            table_for(record.item_type)
        );
        sqlx::query(&sql).bind(&record.original_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM deleted_items WHERE id = ?1")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(archive_id, item_type = %record.item_type, original_id = %record.original_id, "Item purged");
        Ok(record)
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    /// Archive records, newest first.
    pub async fn list(&self, item_type: Option<ItemType>) -> DbResult<Vec<DeletedItem>> {
        let records = match item_type {
            Some(item_type) => {
                let sql = format!(
                    "SELECT {} FROM deleted_items WHERE item_type = ?1 ORDER BY deleted_at DESC, rowid DESC",
                    RECORD_COLUMNS
                );
                sqlx::query_as::<_, DeletedItem>(&sql)
                    .bind(item_type)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM deleted_items ORDER BY deleted_at DESC, rowid DESC",
                    RECORD_COLUMNS
                );
                sqlx::query_as::<_, DeletedItem>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(records)
    }

    pub async fn get(&self, archive_id: &str) -> DbResult<DeletedItem> {
        let mut conn = self.pool.acquire().await?;
        fetch_record(&mut conn, archive_id)
            .await?
            .ok_or_else(|| DbError::not_found("DeletedItem", archive_id))
    }
}

async fn fetch_record(conn: &mut SqliteConnection, archive_id: &str) -> DbResult<Option<DeletedItem>> {
    let sql = format!("SELECT {} FROM deleted_items WHERE id = ?1", RECORD_COLUMNS);
    Ok(sqlx::query_as::<_, DeletedItem>(&sql)
        .bind(archive_id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Why a record cannot be restored, if anything blocks it.
async fn restore_blocker(conn: &mut SqliteConnection, record: &DeletedItem) -> DbResult<Option<&'static str>> {
    let table = table_for(record.item_type);

    let sql = format!("SELECT deleted_at IS NOT NULL FROM {} WHERE id = ?1", table);
    let archived: Option<bool> = sqlx::query_scalar(&sql)
        .bind(&record.original_id)
        .fetch_optional(&mut *conn)
        .await?;
    match archived {
        None => return Ok(Some("original row no longer exists")),
        Some(false) => return Ok(Some("original row is already active")),
        Some(true) => {}
    }

    if record.item_type == ItemType::Sale {
        return Ok(None);
    }

    // Products are identified by name and brand, parties by name.
    let brand_clause = match record.item_type {
        ItemType::Product => {
            "AND COALESCE(lower(brand), '') = (SELECT COALESCE(lower(brand), '') FROM products WHERE id = ?1)"
        }
        _ => "",
    };
    let sql = format!(
        r#"
        SELECT COUNT(*) FROM {table}
        WHERE id != ?1
          AND deleted_at IS NULL
          AND lower(name) = (SELECT lower(name) FROM {table} WHERE id = ?1)
          {brand_clause}
        "#
    );
    let clashes: i64 = sqlx::query_scalar(&sql)
        .bind(&record.original_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok((clashes > 0).then_some("an active record with the same name exists"))
}

fn not_restorable(record: &DeletedItem, reason: &str) -> DbError {
    CoreError::NotRestorable {
        item_type: record.item_type.to_string(),
        id: record.id.clone(),
        reason: reason.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
