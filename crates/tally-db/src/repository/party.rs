//! # Party Repositories
//!
//! Customers and suppliers. Both carry an opening balance and polarity;
//! neither stores a running balance (see [`super::ledger`]).

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::{normalize_optional, validate_name, validate_price_cents};
use tally_core::{BalanceType, Customer, CustomerType, Supplier};

const CUSTOMER_COLUMNS: &str = "id, name, phone, classification, opening_balance_cents, \
     opening_balance_type, created_at, updated_at, deleted_at";

const SUPPLIER_COLUMNS: &str = "id, name, phone, opening_balance_cents, \
     opening_balance_type, created_at, updated_at, deleted_at";

/// Fields for a new customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// `retail` (default) or `long-term` / `wholesale`.
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub opening_balance_cents: i64,
    #[serde(default)]
    pub opening_balance_type: Option<BalanceType>,
}

/// Fields for a new supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub opening_balance_cents: i64,
    /// Defaults to credit: an opening supplier balance is usually owed.
    #[serde(default)]
    pub opening_balance_type: Option<BalanceType>,
}

// =============================================================================
// Transaction-friendly fetches
// =============================================================================

pub(crate) async fn fetch_customer<'e, E>(executor: E, id: &str) -> DbResult<Option<Customer>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
    Ok(sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

/// Fetches an active customer or fails with `NotFound`.
pub(crate) async fn fetch_active_customer<'e, E>(executor: E, id: &str) -> DbResult<Customer>
where
    E: Executor<'e, Database = Sqlite>,
{
    match fetch_customer(executor, id).await? {
        Some(c) if c.deleted_at.is_none() => Ok(c),
        _ => Err(DbError::not_found("Customer", id)),
    }
}

pub(crate) async fn fetch_supplier<'e, E>(executor: E, id: &str) -> DbResult<Option<Supplier>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM suppliers WHERE id = ?1", SUPPLIER_COLUMNS);
    Ok(sqlx::query_as::<_, Supplier>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

/// Fetches an active supplier or fails with `NotFound`.
pub(crate) async fn fetch_active_supplier<'e, E>(executor: E, id: &str) -> DbResult<Supplier>
where
    E: Executor<'e, Database = Sqlite>,
{
    match fetch_supplier(executor, id).await? {
        Some(s) if s.deleted_at.is_none() => Ok(s),
        _ => Err(DbError::not_found("Supplier", id)),
    }
}

// =============================================================================
// Customer Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        let name = validate_name(&new.name)?;
        let classification = match new.classification.as_deref() {
            None => CustomerType::Retail,
            Some(raw) => CustomerType::parse(Some(raw))?,
        };
        validate_price_cents("opening_balance_cents", new.opening_balance_cents)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name,
            phone: normalize_optional("phone", new.phone.as_deref(), 30)?,
            classification,
            opening_balance_cents: new.opening_balance_cents,
            opening_balance_type: new.opening_balance_type.unwrap_or(BalanceType::Debit),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, classification, opening_balance_cents,
                opening_balance_type, created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.classification)
        .bind(customer.opening_balance_cents)
        .bind(customer.opening_balance_type)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets an active customer.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        Ok(fetch_customer(&self.pool, id)
            .await?
            .filter(|c| c.deleted_at.is_none()))
    }

    /// Lists active customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE, id",
            CUSTOMER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

// =============================================================================
// Supplier Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn create(&self, new: NewSupplier) -> DbResult<Supplier> {
        let name = validate_name(&new.name)?;
        validate_price_cents("opening_balance_cents", new.opening_balance_cents)?;

        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name,
            phone: normalize_optional("phone", new.phone.as_deref(), 30)?,
            opening_balance_cents: new.opening_balance_cents,
            opening_balance_type: new.opening_balance_type.unwrap_or(BalanceType::Credit),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, phone, opening_balance_cents,
                opening_balance_type, created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(supplier.opening_balance_cents)
        .bind(supplier.opening_balance_type)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Gets an active supplier.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        Ok(fetch_supplier(&self.pool, id)
            .await?
            .filter(|s| s.deleted_at.is_none()))
    }

    /// Lists active suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            "SELECT {} FROM suppliers WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE, id",
            SUPPLIER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}
