//! # Sale Transaction Engine
//!
//! Turns a client sale request into a committed sale, or nothing at all.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest                                                            │
//! │       │                                                                 │
//! │       ▼  Received                                                       │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼  Validated     customer_type, lines, products, customer        │
//! │       ▼  Priced        PriceOracle::verify + snapshot::freeze          │
//! │       │                DiscountCalculator::sale, submitted totals      │
//! │       ▼  StockChecked  StockLedger::reserve per product (aggregated)   │
//! │       ▼  Committed     INSERT sale + items, COMMIT                     │
//! │                                                                         │
//! │  any error ──► ROLLBACK ──► Rejected (domain) / Failed (storage)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing the client sends about money is trusted: prices come from the
//! oracle, totals are recomputed, and submitted values are only checked.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::party::fetch_active_customer;
use crate::repository::product::{fetch_active_product, fetch_product};
use crate::repository::sale::{
    fetch_active_sale, fetch_items, insert_item, insert_sale, update_item, update_sale,
};
use crate::stock::StockLedger;
use tally_core::discount::{LineTotals, SaleTotals};
use tally_core::snapshot::{self, ItemDrift};
use tally_core::validation::{validate_id, validate_line_count, validate_price_cents, validate_quantity};
use tally_core::{
    CoreError, CustomerType, Discount, DiscountCalculator, Money, PriceOracle, Sale, SaleItem,
    ValidationError, PRICE_TOLERANCE,
};

// =============================================================================
// Requests
// =============================================================================

/// One line of a new sale as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price the client displayed; checked against the oracle.
    pub price_cents: i64,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<i64>,
}

/// A new sale.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    /// Omitted for walk-in sales.
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<i64>,
    /// Client-computed subtotal, checked when present.
    #[serde(default)]
    pub subtotal_cents: Option<i64>,
    /// Client-computed total, checked when present.
    #[serde(default)]
    pub total_amount_cents: Option<i64>,
}

/// Change to an existing line, addressed by item id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineEdit {
    pub item_id: String,
    #[serde(default)]
    pub quantity: Option<i64>,
    /// When absent the line keeps its discount.
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<i64>,
}

/// Edit of an existing sale.
///
/// `customer_type` may be echoed back unchanged; any other value is refused.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleEdit {
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Turns the sale into a walk-in sale.
    #[serde(default)]
    pub clear_customer: bool,
    #[serde(default)]
    pub items: Vec<LineEdit>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<i64>,
    #[serde(default)]
    pub subtotal_cents: Option<i64>,
    #[serde(default)]
    pub total_amount_cents: Option<i64>,
}

// =============================================================================
// Responses
// =============================================================================

/// A committed sale and its frozen lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// A frozen line next to how the live product has moved since.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalItem {
    #[serde(flatten)]
    pub item: SaleItem,
    pub drift: ItemDrift,
}

/// A sale as recorded, for history views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<HistoricalItem>,
}

/// Where a sale is in the commit pipeline. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleStage {
    Received,
    Validated,
    Priced,
    StockChecked,
    Committed,
    Rejected,
    Failed,
}

impl SaleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStage::Received => "received",
            SaleStage::Validated => "validated",
            SaleStage::Priced => "priced",
            SaleStage::StockChecked => "stock_checked",
            SaleStage::Committed => "committed",
            SaleStage::Rejected => "rejected",
            SaleStage::Failed => "failed",
        }
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailPoint {
    AfterStockReserved,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
    #[cfg(test)]
    fail_point: Option<FailPoint>,
}

impl SaleEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine {
            pool,
            #[cfg(test)]
            fail_point: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_fail_point(mut self, point: FailPoint) -> Self {
        self.fail_point = Some(point);
        self
    }

    /// Validates, prices, reserves stock for and persists a new sale.
    ///
    /// Either every row (sale, items, stock decrements) commits or none does.
    pub async fn create_sale(&self, request: SaleRequest) -> DbResult<SaleReceipt> {
        let sale_id = Uuid::new_v4().to_string();
        debug!(
            sale_id = %sale_id,
            stage = SaleStage::Received.as_str(),
            lines = request.items.len(),
            "Sale received"
        );

        let mut tx = begin_write(&self.pool).await?;
        let outcome = self.commit_new_sale(&mut tx, &sale_id, &request).await;
        let receipt = finish(tx, &sale_id, outcome).await?;

        info!(
            sale_id = %sale_id,
            customer_type = %receipt.sale.customer_type,
            items = receipt.items.len(),
            total = %receipt.sale.total(),
            "Sale committed"
        );
        Ok(receipt)
    }

    async fn commit_new_sale(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        request: &SaleRequest,
    ) -> DbResult<SaleReceipt> {
        let customer_type = CustomerType::parse(request.customer_type.as_deref())?;
        validate_line_count(request.items.len())?;
        let sale_discount = Discount::parse(
            request.discount_type.as_deref(),
            request.discount_value,
            "discount",
        )?;

        let customer_id = match request.customer_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(fetch_active_customer(&mut *conn, id).await?.id),
        };

        let mut lines = Vec::with_capacity(request.items.len());
        for (idx, line) in request.items.iter().enumerate() {
            validate_id("product_id", &line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_price_cents(&format!("items[{}].price_cents", idx), line.price_cents)?;
            let discount = Discount::parse(
                line.discount_type.as_deref(),
                line.discount_value,
                &format!("items[{}].discount", idx),
            )?;
            let product = fetch_active_product(&mut *conn, line.product_id.trim()).await?;
            lines.push((product, line, discount));
        }
        stage(sale_id, SaleStage::Validated);

        let now = Utc::now();
        let mut items = Vec::with_capacity(lines.len());
        for (product, line, discount) in &lines {
            let unit_price =
                PriceOracle::verify(product, customer_type, Money::from_cents(line.price_cents))?;
            items.push(snapshot::freeze(sale_id, product, unit_price, line.quantity, *discount, now)?);
        }
        let totals = sale_totals(&items, sale_discount);
        check_submitted(request.subtotal_cents, request.total_amount_cents, &totals)?;
        stage(sale_id, SaleStage::Priced);

        for (product_id, quantity) in aggregate_quantities(&items) {
            StockLedger::reserve(conn, &product_id, quantity).await?;
        }
        stage(sale_id, SaleStage::StockChecked);

        #[cfg(test)]
        if self.fail_point == Some(FailPoint::AfterStockReserved) {
            return Err(DbError::Internal("injected failure after stock reservation".to_string()));
        }

        let (discount_type, discount_value) = sale_discount.to_parts();
        let sale = Sale {
            id: sale_id.to_string(),
            customer_type,
            customer_id,
            subtotal_cents: totals.subtotal.cents(),
            discount_type,
            discount_value,
            discount_amount_cents: totals.discount_amount.cents(),
            total_amount_cents: totals.total.cents(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        insert_sale(conn, &sale).await?;
        for item in &items {
            insert_item(conn, item).await?;
        }

        Ok(SaleReceipt { sale, items })
    }

    /// Applies an edit to an active sale in one transaction.
    ///
    /// Frozen unit prices and product facts are kept; quantities move stock
    /// by their delta and totals are recomputed from the stored lines.
    pub async fn update_sale(&self, sale_id: &str, edit: SaleEdit) -> DbResult<SaleDetail> {
        debug!(sale_id, lines = edit.items.len(), "Sale edit received");

        let mut tx = begin_write(&self.pool).await?;
        let outcome = self.apply_edit(&mut tx, sale_id, &edit).await;
        let sale = finish(tx, sale_id, outcome).await?;

        info!(sale_id, total = %sale.total(), "Sale updated");
        self.get_sale_detail(sale_id).await
    }

    async fn apply_edit(&self, conn: &mut SqliteConnection, sale_id: &str, edit: &SaleEdit) -> DbResult<Sale> {
        let mut sale = fetch_active_sale(&mut *conn, sale_id).await?;

        if let Some(raw) = edit.customer_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            match raw.parse::<CustomerType>() {
                Ok(requested) if requested == sale.customer_type => {}
                _ => {
                    return Err(CoreError::CustomerTypeLocked {
                        sale_id: sale.id.clone(),
                        current: sale.customer_type.to_string(),
                        requested: raw.to_string(),
                    }
                    .into())
                }
            }
        }

        let new_customer = edit.customer_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if edit.clear_customer {
            if new_customer.is_some() {
                return Err(ValidationError::InvalidFormat {
                    field: "customer_id".to_string(),
                    reason: "cannot be combined with clear_customer".to_string(),
                }
                .into());
            }
            sale.customer_id = None;
        } else if let Some(id) = new_customer {
            sale.customer_id = Some(fetch_active_customer(&mut *conn, id).await?.id);
        }

        let mut items = fetch_items(&mut *conn, sale_id).await?;
        for (idx, change) in edit.items.iter().enumerate() {
            let pos = items
                .iter()
                .position(|i| i.id == change.item_id)
                .ok_or_else(|| DbError::not_found("SaleItem", &change.item_id))?;

            let current = &items[pos];
            let quantity = change.quantity.unwrap_or(current.quantity);
            validate_quantity(quantity)?;
            let discount = match change.discount_type.as_deref() {
                Some(kind) => Discount::parse(
                    Some(kind),
                    change.discount_value,
                    &format!("items[{}].discount", idx),
                )?,
                None => current.discount(),
            };

            if quantity != current.quantity {
                let product_id = current
                    .product_id
                    .as_deref()
                    .ok_or_else(|| DbError::not_found("Product", &current.product_name))?;
                StockLedger::apply_delta(conn, product_id, current.quantity, quantity).await?;
            }

            let updated = snapshot::reprice(current, quantity, discount)?;
            update_item(conn, &updated).await?;
            items[pos] = updated;
        }

        let sale_discount = match edit.discount_type.as_deref() {
            Some(kind) => Discount::parse(Some(kind), edit.discount_value, "discount")?,
            None => sale.discount(),
        };
        let totals = sale_totals(&items, sale_discount);
        check_submitted(edit.subtotal_cents, edit.total_amount_cents, &totals)?;

        let (discount_type, discount_value) = sale_discount.to_parts();
        sale.subtotal_cents = totals.subtotal.cents();
        sale.discount_type = discount_type;
        sale.discount_value = discount_value;
        sale.discount_amount_cents = totals.discount_amount.cents();
        sale.total_amount_cents = totals.total.cents();
        sale.updated_at = Utc::now();

        update_sale(conn, &sale).await?;
        Ok(sale)
    }

    /// An active sale with its lines exactly as recorded, plus drift.
    pub async fn get_sale_detail(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let sale = fetch_active_sale(&mut *conn, sale_id).await?;
        let stored = fetch_items(&mut *conn, sale_id).await?;

        let mut items = Vec::with_capacity(stored.len());
        for item in stored {
            let current = match item.product_id.as_deref() {
                Some(product_id) => fetch_product(&mut *conn, product_id).await?,
                None => None,
            };
            let drift = snapshot::drift(&item, current.as_ref(), sale.customer_type);
            items.push(HistoricalItem { item, drift });
        }

        Ok(SaleDetail { sale, items })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn stage(sale_id: &str, stage: SaleStage) {
    debug!(sale_id, stage = stage.as_str(), "Sale stage reached");
}

/// Commits on success, rolls back on error, and logs the terminal stage.
async fn finish<T>(tx: Transaction<'_, Sqlite>, sale_id: &str, outcome: DbResult<T>) -> DbResult<T> {
    match outcome {
        Ok(value) => {
            if let Err(e) = tx.commit().await {
                error!(sale_id, stage = SaleStage::Failed.as_str(), error = %e, "Commit failed");
                return Err(DbError::TransactionFailed(e.to_string()));
            }
            debug!(sale_id, stage = SaleStage::Committed.as_str(), "Sale stage reached");
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                warn!(sale_id, error = %e, "Rollback failed");
            }
            match err.as_domain() {
                Some(reason) => {
                    warn!(sale_id, stage = SaleStage::Rejected.as_str(), reason = %reason, "Sale rejected")
                }
                None => error!(sale_id, stage = SaleStage::Failed.as_str(), error = %err, "Sale failed"),
            }
            Err(err)
        }
    }
}

fn sale_totals(items: &[SaleItem], discount: Discount) -> SaleTotals {
    let lines: Vec<LineTotals> = items.iter().map(snapshot::stored_totals).collect();
    DiscountCalculator::sale(&lines, discount)
}

fn check_submitted(subtotal: Option<i64>, total: Option<i64>, computed: &SaleTotals) -> Result<(), CoreError> {
    for (field, submitted, expected) in [
        ("subtotal", subtotal, computed.subtotal),
        ("total_amount", total, computed.total),
    ] {
        if let Some(cents) = submitted {
            validate_price_cents(&format!("{}_cents", field), cents)?;
            let submitted = Money::from_cents(cents);
            if !submitted.within(expected, PRICE_TOLERANCE) {
                return Err(CoreError::TotalMismatch {
                    field: field.to_string(),
                    submitted,
                    expected,
                });
            }
        }
    }
    Ok(())
}

/// Sums quantities per product, keeping first-seen order.
pub(crate) fn aggregate_quantities(items: &[SaleItem]) -> Vec<(String, i64)> {
    let mut totals: Vec<(String, i64)> = Vec::new();
    for item in items {
        let Some(product_id) = &item.product_id else { continue };
        match totals.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => totals.push((product_id.clone(), item.quantity)),
        }
    }
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::party::NewCustomer;
    use crate::repository::product::{NewProduct, ProductUpdate};
    use tally_core::{DiscountKind, Product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, retail: i64, wholesale: Option<i64>, stock: i64) -> Product {
        db.products()
            .create(NewProduct {
                name: name.to_string(),
                brand: Some("Lucky".to_string()),
                category: Some("Building".to_string()),
                unit_of_measure: Some("bag".to_string()),
                retail_price_cents: retail,
                wholesale_price_cents: wholesale,
                cost_price_cents: None,
                stock_quantity: stock,
            })
            .await
            .unwrap()
    }

    fn line(product_id: &str, quantity: i64, price_cents: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
            price_cents,
            discount_type: None,
            discount_value: None,
        }
    }

    fn request(customer_type: &str, items: Vec<SaleLineRequest>) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            customer_type: Some(customer_type.to_string()),
            items,
            discount_type: None,
            discount_value: None,
            subtotal_cents: None,
            total_amount_cents: None,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_any(id).await.unwrap().unwrap().stock_quantity
    }

    async fn assert_nothing_written(db: &Database) {
        assert_eq!(db.sales().count_all().await.unwrap(), 0);
        assert_eq!(db.sales().count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retail_sale_with_line_discount() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, Some(8000), 5).await;

        let mut l = line(&p.id, 2, 10000);
        l.discount_type = Some("percentage".to_string());
        l.discount_value = Some(1000);
        let mut req = request("retail", vec![l]);
        req.total_amount_cents = Some(18000);

        let receipt = db.engine().create_sale(req).await.unwrap();

        assert_eq!(receipt.sale.subtotal_cents, 18000);
        assert_eq!(receipt.sale.total_amount_cents, 18000);
        assert!(receipt.sale.is_walk_in());
        let item = &receipt.items[0];
        assert_eq!(item.unit_price_cents, 10000);
        assert_eq!(item.original_price_cents, 20000);
        assert_eq!(item.discount_amount_cents, 2000);
        assert_eq!(item.final_price_cents, 18000);
        assert_eq!(item.product_name, "Cement 50kg");
        assert_eq!(stock_of(&db, &p.id).await, 3);
    }

    #[tokio::test]
    async fn test_long_term_uses_wholesale_within_tolerance() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, Some(8000), 10).await;

        let ok = db
            .engine()
            .create_sale(request("long-term", vec![line(&p.id, 1, 8001)]))
            .await
            .unwrap();
        // The oracle price is persisted, not the submitted one.
        assert_eq!(ok.items[0].unit_price_cents, 8000);

        let err = db
            .engine()
            .create_sale(request("long-term", vec![line(&p.id, 1, 8002)]))
            .await
            .unwrap_err();
        match err.as_domain() {
            Some(CoreError::PriceMismatch { submitted, expected, .. }) => {
                assert_eq!(submitted.cents(), 8002);
                assert_eq!(expected.cents(), 8000);
            }
            other => panic!("expected PriceMismatch, got {other:?}"),
        }
        assert_eq!(db.sales().count_all().await.unwrap(), 1);
        assert_eq!(stock_of(&db, &p.id).await, 9);
    }

    #[tokio::test]
    async fn test_retail_price_submitted_for_long_term_is_rejected() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, Some(8000), 10).await;

        let err = db
            .engine()
            .create_sale(request("wholesale", vec![line(&p.id, 1, 10000)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::PriceMismatch { .. })));
        assert_nothing_written(&db).await;
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 10).await;

        let empty = db.engine().create_sale(request("retail", vec![])).await.unwrap_err();
        assert!(matches!(empty.as_domain(), Some(CoreError::Validation(_))));

        let zero = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 0, 10000)]))
            .await
            .unwrap_err();
        assert!(matches!(zero.as_domain(), Some(CoreError::Validation(_))));

        let mut untyped = request("retail", vec![line(&p.id, 1, 10000)]);
        untyped.customer_type = None;
        let err = db.engine().create_sale(untyped).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));

        let unknown = db
            .engine()
            .create_sale(request("retail", vec![line("missing", 1, 10000)]))
            .await
            .unwrap_err();
        assert!(matches!(unknown.as_domain(), Some(CoreError::NotFound { .. })));

        let mut ghost_customer = request("retail", vec![line(&p.id, 1, 10000)]);
        ghost_customer.customer_id = Some("nobody".to_string());
        let err = db.engine().create_sale(ghost_customer).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));

        assert_nothing_written(&db).await;
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_deleted_product_cannot_be_sold() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 10).await;
        sqlx::query("UPDATE products SET deleted_at = ?2 WHERE id = ?1")
            .bind(&p.id)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 1, 10000)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_checked_against_combined_quantity() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 3).await;

        let err = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 2, 10000), line(&p.id, 2, 10000)]))
            .await
            .unwrap_err();
        match err.as_domain() {
            Some(CoreError::InsufficientStock { available, requested, .. }) => {
                assert_eq!(*available, 3);
                assert_eq!(*requested, 4);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_nothing_written(&db).await;
        assert_eq!(stock_of(&db, &p.id).await, 3);
    }

    #[tokio::test]
    async fn test_second_line_failure_releases_first_line_stock() {
        let db = setup().await;
        let a = product(&db, "Cement 50kg", 10000, None, 5).await;
        let b = product(&db, "Sand 1cft", 500, None, 0).await;

        let err = db
            .engine()
            .create_sale(request("retail", vec![line(&a.id, 2, 10000), line(&b.id, 1, 500)]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::OutOfStock { .. })));
        assert_eq!(stock_of(&db, &a.id).await, 5);
        assert_nothing_written(&db).await;
    }

    #[tokio::test]
    async fn test_total_mismatch() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;

        let mut req = request("retail", vec![line(&p.id, 2, 10000)]);
        req.total_amount_cents = Some(19000);
        let err = db.engine().create_sale(req).await.unwrap_err();
        match err.as_domain() {
            Some(CoreError::TotalMismatch { field, expected, .. }) => {
                assert_eq!(field, "total_amount");
                assert_eq!(expected.cents(), 20000);
            }
            other => panic!("expected TotalMismatch, got {other:?}"),
        }
        assert_eq!(stock_of(&db, &p.id).await, 5);

        let mut req = request("retail", vec![line(&p.id, 2, 10000)]);
        req.subtotal_cents = Some(20001);
        req.total_amount_cents = Some(19999);
        db.engine().create_sale(req).await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_range_amounts_fail_before_any_write() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;

        for price in [i64::MIN, -1, i64::MAX] {
            let err = db
                .engine()
                .create_sale(request("retail", vec![line(&p.id, 1, price)]))
                .await
                .unwrap_err();
            assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))), "price {price}");
        }

        let mut req = request("retail", vec![line(&p.id, 1, 10000)]);
        req.subtotal_cents = Some(i64::MIN);
        let err = db.engine().create_sale(req).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));

        assert_nothing_written(&db).await;
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_sale_discount_floors_at_zero() {
        let db = setup().await;
        let a = product(&db, "Cement 50kg", 10000, None, 5).await;
        let b = product(&db, "Sand 1cft", 500, None, 5).await;

        let mut req = request("retail", vec![line(&a.id, 1, 10000), line(&b.id, 2, 500)]);
        req.discount_type = Some("amount".to_string());
        req.discount_value = Some(50000);
        let receipt = db.engine().create_sale(req).await.unwrap();

        assert_eq!(receipt.sale.subtotal_cents, 11000);
        assert_eq!(receipt.sale.discount_amount_cents, 11000);
        assert_eq!(receipt.sale.total_amount_cents, 0);
        assert_eq!(receipt.sale.discount_type, DiscountKind::Amount);
    }

    #[tokio::test]
    async fn test_failure_after_reservation_rolls_everything_back() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;

        let engine = db.engine().with_fail_point(FailPoint::AfterStockReserved);
        let err = engine
            .create_sale(request("retail", vec![line(&p.id, 2, 10000)]))
            .await
            .unwrap_err();

        assert!(err.as_domain().is_none());
        assert_eq!(stock_of(&db, &p.id).await, 5);
        assert_nothing_written(&db).await;
    }

    #[tokio::test]
    async fn test_history_survives_product_changes() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;
        let receipt = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 1, 10000)]))
            .await
            .unwrap();

        db.products()
            .update(
                &p.id,
                ProductUpdate {
                    name: Some("Cement 50kg OPC".to_string()),
                    retail_price_cents: Some(12000),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();

        let detail = db.engine().get_sale_detail(&receipt.sale.id).await.unwrap();
        let item = &detail.items[0];
        assert_eq!(item.item.product_name, "Cement 50kg");
        assert_eq!(item.item.unit_price_cents, 10000);
        assert_eq!(item.item.brand.as_deref(), Some("Lucky"));
        assert!(item.drift.renamed);
        assert!(item.drift.price_changed);
        assert!(!item.drift.product_deleted);
        assert_eq!(item.drift.current_price_cents, Some(12000));
    }

    #[tokio::test]
    async fn test_customer_type_is_locked_after_creation() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, Some(8000), 5).await;
        let receipt = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 1, 10000)]))
            .await
            .unwrap();

        let err = db
            .engine()
            .update_sale(
                &receipt.sale.id,
                SaleEdit {
                    customer_type: Some("long-term".to_string()),
                    ..SaleEdit::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::CustomerTypeLocked { .. })));

        // Echoing the stored type back is fine.
        let detail = db
            .engine()
            .update_sale(
                &receipt.sale.id,
                SaleEdit {
                    customer_type: Some("retail".to_string()),
                    ..SaleEdit::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.sale.customer_type, CustomerType::Retail);
    }

    #[tokio::test]
    async fn test_edit_moves_stock_by_delta_and_recomputes_totals() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;
        let mut l = line(&p.id, 2, 10000);
        l.discount_type = Some("percentage".to_string());
        l.discount_value = Some(1000);
        let receipt = db.engine().create_sale(request("retail", vec![l])).await.unwrap();
        let item_id = receipt.items[0].id.clone();
        assert_eq!(stock_of(&db, &p.id).await, 3);

        let grow = SaleEdit {
            items: vec![LineEdit {
                item_id: item_id.clone(),
                quantity: Some(4),
                ..LineEdit::default()
            }],
            total_amount_cents: Some(36000),
            ..SaleEdit::default()
        };
        let detail = db.engine().update_sale(&receipt.sale.id, grow).await.unwrap();
        assert_eq!(detail.sale.total_amount_cents, 36000);
        assert_eq!(detail.items[0].item.discount_amount_cents, 4000);
        assert_eq!(stock_of(&db, &p.id).await, 1);

        let too_many = SaleEdit {
            items: vec![LineEdit {
                item_id: item_id.clone(),
                quantity: Some(6),
                ..LineEdit::default()
            }],
            ..SaleEdit::default()
        };
        let err = db.engine().update_sale(&receipt.sale.id, too_many).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InsufficientStock { .. })));
        assert_eq!(stock_of(&db, &p.id).await, 1);

        let shrink = SaleEdit {
            items: vec![LineEdit {
                item_id,
                quantity: Some(1),
                discount_type: Some("none".to_string()),
                discount_value: None,
            }],
            ..SaleEdit::default()
        };
        let detail = db.engine().update_sale(&receipt.sale.id, shrink).await.unwrap();
        assert_eq!(detail.sale.total_amount_cents, 10000);
        assert_eq!(detail.items[0].item.unit_price_cents, 10000);
        assert_eq!(stock_of(&db, &p.id).await, 4);
    }

    #[tokio::test]
    async fn test_edit_customer_link() {
        let db = setup().await;
        let p = product(&db, "Cement 50kg", 10000, None, 5).await;
        let customer = db
            .customers()
            .create(NewCustomer {
                name: "Bilal Traders".to_string(),
                phone: None,
                classification: None,
                opening_balance_cents: 0,
                opening_balance_type: None,
            })
            .await
            .unwrap();
        let receipt = db
            .engine()
            .create_sale(request("retail", vec![line(&p.id, 1, 10000)]))
            .await
            .unwrap();

        let detail = db
            .engine()
            .update_sale(
                &receipt.sale.id,
                SaleEdit {
                    customer_id: Some(customer.id.clone()),
                    ..SaleEdit::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.sale.customer_id.as_deref(), Some(customer.id.as_str()));

        let detail = db
            .engine()
            .update_sale(
                &receipt.sale.id,
                SaleEdit {
                    clear_customer: true,
                    ..SaleEdit::default()
                },
            )
            .await
            .unwrap();
        assert!(detail.sale.is_walk_in());
    }

    #[test]
    fn test_aggregate_quantities_keeps_order() {
        let now = Utc::now();
        let mk = |pid: &str, qty: i64| SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: "s".to_string(),
            product_id: Some(pid.to_string()),
            product_name: pid.to_string(),
            brand: None,
            category: None,
            unit_of_measure: "pcs".to_string(),
            unit_price_cents: 100,
            quantity: qty,
            original_price_cents: 100 * qty,
            discount_type: DiscountKind::None,
            discount_value: 0,
            discount_amount_cents: 0,
            final_price_cents: 100 * qty,
            created_at: now,
        };

        let totals = aggregate_quantities(&[mk("b", 1), mk("a", 2), mk("b", 3)]);
        assert_eq!(totals, vec![("b".to_string(), 4), ("a".to_string(), 2)]);
    }
}
