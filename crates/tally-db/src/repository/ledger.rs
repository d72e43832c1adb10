//! # Ledger Repository
//!
//! Records payments and purchases, and loads the event stream a statement
//! is folded from.
//!
//! ## Statement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer_statement(id)                                                 │
//! │       │                                                                 │
//! │       ├── customers row (active)   → opening balance + polarity        │
//! │       ├── sales (not deleted)      → EventKind::Sale                   │
//! │       └── payments (not deleted)   → EventKind::Payment                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tally_core::ledger::compute_running_balance (pure fold)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All reads for one statement share a transaction so they see one snapshot.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::party::{fetch_active_customer, fetch_active_supplier};
use tally_core::ledger::{compute_running_balance, EventKind, LedgerEvent, Opening, Statement};
use tally_core::validation::{normalize_optional, validate_amount_cents};
use tally_core::{Money, PartyType, Payment, Purchase};

/// A payment to record against a party.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub amount_cents: i64,
    /// Defaults to now.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A purchase on account from a supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    pub total_amount_cents: i64,
    /// Defaults to now.
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

type EventRow = (String, i64, Option<String>, DateTime<Utc>, i64);

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Records money received from a customer.
    pub async fn record_customer_payment(&self, customer_id: &str, new: NewPayment) -> DbResult<Payment> {
        fetch_active_customer(&self.pool, customer_id).await?;
        self.insert_payment(PartyType::Customer, customer_id, new).await
    }

    /// Records money paid to a supplier.
    pub async fn record_supplier_payment(&self, supplier_id: &str, new: NewPayment) -> DbResult<Payment> {
        fetch_active_supplier(&self.pool, supplier_id).await?;
        self.insert_payment(PartyType::Supplier, supplier_id, new).await
    }

    async fn insert_payment(&self, party_type: PartyType, party_id: &str, new: NewPayment) -> DbResult<Payment> {
        validate_amount_cents("amount_cents", new.amount_cents)?;

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            party_type,
            party_id: party_id.to_string(),
            amount_cents: new.amount_cents,
            description: normalize_optional("description", new.description.as_deref(), 500)?,
            paid_at: new.paid_at.unwrap_or(now),
            created_at: now,
            deleted_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, party_type, party_id, amount_cents, description, paid_at, created_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)
            "#,
        )
        .bind(&payment.id)
        .bind(payment.party_type)
        .bind(&payment.party_id)
        .bind(payment.amount_cents)
        .bind(&payment.description)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %payment.id,
            party_type = party_type.as_str(),
            party_id,
            amount = %Money::from_cents(payment.amount_cents),
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Records goods bought on account from a supplier.
    pub async fn record_purchase(&self, supplier_id: &str, new: NewPurchase) -> DbResult<Purchase> {
        fetch_active_supplier(&self.pool, supplier_id).await?;
        validate_amount_cents("total_amount_cents", new.total_amount_cents)?;

        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            supplier_id: supplier_id.to_string(),
            total_amount_cents: new.total_amount_cents,
            description: normalize_optional("description", new.description.as_deref(), 500)?,
            purchased_at: new.purchased_at.unwrap_or(now),
            created_at: now,
            deleted_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, supplier_id, total_amount_cents, description, purchased_at, created_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.supplier_id)
        .bind(purchase.total_amount_cents)
        .bind(&purchase.description)
        .bind(purchase.purchased_at)
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %purchase.id, supplier_id, "Purchase recorded");
        Ok(purchase)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Running balance for a customer: sales debit, payments credit.
    pub async fn customer_statement(&self, customer_id: &str) -> DbResult<Statement> {
        let mut tx = self.pool.begin().await?;

        let customer = fetch_active_customer(&mut *tx, customer_id).await?;
        let mut events = sale_events(&mut tx, customer_id).await?;
        events.extend(payment_events(&mut tx, PartyType::Customer, customer_id).await?);
        tx.rollback().await?;

        debug!(customer_id, events = events.len(), "Folding customer statement");

        let opening = Opening {
            balance: customer.opening_balance(),
            at: customer.created_at,
        };
        Ok(compute_running_balance(PartyType::Customer, customer_id, opening, events))
    }

    /// Running balance for a supplier: purchases credit, payments debit.
    pub async fn supplier_statement(&self, supplier_id: &str) -> DbResult<Statement> {
        let mut tx = self.pool.begin().await?;

        let supplier = fetch_active_supplier(&mut *tx, supplier_id).await?;
        let mut events = purchase_events(&mut tx, supplier_id).await?;
        events.extend(payment_events(&mut tx, PartyType::Supplier, supplier_id).await?);
        tx.rollback().await?;

        debug!(supplier_id, events = events.len(), "Folding supplier statement");

        let opening = Opening {
            balance: supplier.opening_balance(),
            at: supplier.created_at,
        };
        Ok(compute_running_balance(PartyType::Supplier, supplier_id, opening, events))
    }
}

// =============================================================================
// Event loading
// =============================================================================

fn short_ref(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn into_events(kind: EventKind, rows: Vec<EventRow>, fallback: impl Fn(&str) -> String) -> Vec<LedgerEvent> {
    rows.into_iter()
        .map(|(id, amount, description, occurred_at, sequence)| LedgerEvent {
            kind,
            description: description.unwrap_or_else(|| fallback(&id)),
            reference_id: id,
            amount: Money::from_cents(amount),
            occurred_at,
            sequence,
        })
        .collect()
}

async fn sale_events(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Vec<LedgerEvent>> {
    let rows: Vec<EventRow> = sqlx::query_as(
        r#"
        SELECT id, total_amount_cents, NULL, created_at, rowid
        FROM sales
        WHERE customer_id = ?1 AND deleted_at IS NULL
        "#,
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(into_events(EventKind::Sale, rows, |id| format!("Sale #{}", short_ref(id))))
}

async fn payment_events(
    conn: &mut SqliteConnection,
    party_type: PartyType,
    party_id: &str,
) -> DbResult<Vec<LedgerEvent>> {
    let rows: Vec<EventRow> = sqlx::query_as(
        r#"
        SELECT id, amount_cents, description, paid_at, rowid
        FROM payments
        WHERE party_type = ?1 AND party_id = ?2 AND deleted_at IS NULL
        "#,
    )
    .bind(party_type)
    .bind(party_id)
    .fetch_all(&mut *conn)
    .await?;

    let label = match party_type {
        PartyType::Customer => "Payment received",
        PartyType::Supplier => "Payment made",
    };
    Ok(into_events(EventKind::Payment, rows, |_| label.to_string()))
}

async fn purchase_events(conn: &mut SqliteConnection, supplier_id: &str) -> DbResult<Vec<LedgerEvent>> {
    let rows: Vec<EventRow> = sqlx::query_as(
        r#"
        SELECT id, total_amount_cents, description, purchased_at, rowid
        FROM purchases
        WHERE supplier_id = ?1 AND deleted_at IS NULL
        "#,
    )
    .bind(supplier_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(into_events(EventKind::Purchase, rows, |id| format!("Purchase #{}", short_ref(id))))
}

// =============================================================================
// Unit Tests
// =============================================================================
