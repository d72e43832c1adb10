//! # Product Repository
//!
//! Catalogue reads and writes for products.
//!
//! ## Key Operations
//! - Create / update / list active products
//! - Row fetches usable inside a caller's transaction (engine, archive)
//!
//! Stock is only ever changed here through `create` and `update` (manual
//! inventory edits). Sales move stock exclusively through
//! [`crate::stock::StockLedger`].

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::{normalize_optional, validate_name, validate_price_cents, validate_stock};
use tally_core::Product;

const PRODUCT_COLUMNS: &str = "id, name, brand, category, unit_of_measure, \
     retail_price_cents, wholesale_price_cents, cost_price_cents, stock_quantity, \
     created_at, updated_at, deleted_at";

/// Fields for a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    pub retail_price_cents: i64,
    #[serde(default)]
    pub wholesale_price_cents: Option<i64>,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default)]
    pub stock_quantity: i64,
}

/// Partial product update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub retail_price_cents: Option<i64>,
    pub wholesale_price_cents: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
}

// =============================================================================
// Transaction-friendly fetches
// =============================================================================

/// Fetches a product regardless of its soft-delete state.
pub(crate) async fn fetch_product<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(product)
}

/// Fetches an active product or fails with `NotFound`.
pub(crate) async fn fetch_active_product<'e, E>(executor: E, id: &str) -> DbResult<Product>
where
    E: Executor<'e, Database = Sqlite>,
{
    match fetch_product(executor, id).await? {
        Some(product) if !product.is_deleted() => Ok(product),
        _ => Err(DbError::not_found("Product", id)),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().create(new_product).await?;
/// let listing = db.products().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product after validating its fields.
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let name = validate_name(&new.name)?;
        validate_price_cents("retail_price_cents", new.retail_price_cents)?;
        if let Some(w) = new.wholesale_price_cents {
            validate_price_cents("wholesale_price_cents", w)?;
        }
        if let Some(c) = new.cost_price_cents {
            validate_price_cents("cost_price_cents", c)?;
        }
        validate_stock(new.stock_quantity)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name,
            brand: normalize_optional("brand", new.brand.as_deref(), 100)?,
            category: normalize_optional("category", new.category.as_deref(), 100)?,
            unit_of_measure: normalize_optional("unit_of_measure", new.unit_of_measure.as_deref(), 20)?
                .unwrap_or_else(|| "pcs".to_string()),
            retail_price_cents: new.retail_price_cents,
            wholesale_price_cents: new.wholesale_price_cents,
            cost_price_cents: new.cost_price_cents,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, brand, category, unit_of_measure,
                retail_price_cents, wholesale_price_cents, cost_price_cents,
                stock_quantity, created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.unit_of_measure)
        .bind(product.retail_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.stock_quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Ok(fetch_product(&self.pool, id)
            .await?
            .filter(|p| !p.is_deleted()))
    }

    /// Gets a product by ID including soft-deleted rows.
    pub async fn get_any(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Lists active products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE, id",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Applies a partial update to an active product.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(name) = update.name.as_deref() {
            product.name = validate_name(name)?;
        }
        if let Some(brand) = update.brand.as_deref() {
            product.brand = normalize_optional("brand", Some(brand), 100)?;
        }
        if let Some(category) = update.category.as_deref() {
            product.category = normalize_optional("category", Some(category), 100)?;
        }
        if let Some(uom) = update.unit_of_measure.as_deref() {
            product.unit_of_measure = normalize_optional("unit_of_measure", Some(uom), 20)?
                .unwrap_or_else(|| "pcs".to_string());
        }
        if let Some(cents) = update.retail_price_cents {
            validate_price_cents("retail_price_cents", cents)?;
            product.retail_price_cents = cents;
        }
        if let Some(cents) = update.wholesale_price_cents {
            validate_price_cents("wholesale_price_cents", cents)?;
            product.wholesale_price_cents = Some(cents);
        }
        if let Some(cents) = update.cost_price_cents {
            validate_price_cents("cost_price_cents", cents)?;
            product.cost_price_cents = Some(cents);
        }
        if let Some(qty) = update.stock_quantity {
            validate_stock(qty)?;
            product.stock_quantity = qty;
        }
        product.updated_at = Utc::now();

        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, brand = ?3, category = ?4, unit_of_measure = ?5,
                retail_price_cents = ?6, wholesale_price_cents = ?7, cost_price_cents = ?8,
                stock_quantity = ?9, updated_at = ?10
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.unit_of_measure)
        .bind(product.retail_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.stock_quantity)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(product)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tally_core::{CoreError, ValidationError};

    fn cement() -> NewProduct {
        NewProduct {
            name: "Cement 50kg".to_string(),
            brand: Some("Lucky".to_string()),
            category: Some("Building".to_string()),
            unit_of_measure: Some("bag".to_string()),
            retail_price_cents: 10000,
            wholesale_price_cents: Some(8000),
            cost_price_cents: None,
            stock_quantity: 5,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.products().create(cement()).await.unwrap();

        let fetched = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut bad = cement();
        bad.retail_price_cents = -1;

        let err = db.products().create(bad).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.products().create(cement()).await.unwrap();

        let updated = db
            .products()
            .update(
                &created.id,
                ProductUpdate {
                    retail_price_cents: Some(12000),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.retail_price_cents, 12000);
        assert_eq!(updated.name, "Cement 50kg");
        assert_eq!(updated.wholesale_price_cents, Some(8000));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .products()
            .update("nope", ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
    }
}
