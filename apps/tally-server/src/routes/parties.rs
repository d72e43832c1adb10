//! Customer and supplier endpoints, including their ledgers.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tally_core::ledger::Statement;
use tally_core::{CoreError, Customer, ItemType, Payment, Purchase, Supplier};
use tally_db::repository::ledger::{NewPayment, NewPurchase};
use tally_db::repository::party::{NewCustomer, NewSupplier};

use super::archive::{soft_delete, ArchivedRef};
use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// Customers
// =============================================================================

/// GET /customers
pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let Json(new) = body?;
    let customer = state.db.customers().create(new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id}
pub async fn get_customer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Customer>> {
    state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::not_found("Customer", &id).into())
}

/// DELETE /customers/{id}
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    soft_delete(&state, ItemType::Customer, &id, &body).await
}

/// GET /customers/{id}/history
pub async fn customer_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Statement>> {
    Ok(Json(state.db.ledger().customer_statement(&id).await?))
}

/// POST /customers/{id}/payments
pub async fn customer_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let Json(new) = body?;
    let payment = state.db.ledger().record_customer_payment(&id, new).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// =============================================================================
// Suppliers
// =============================================================================

/// GET /suppliers
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

/// POST /suppliers
pub async fn create_supplier(
    State(state): State<AppState>,
    body: Result<Json<NewSupplier>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let Json(new) = body?;
    let supplier = state.db.suppliers().create(new).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// GET /suppliers/{id}
pub async fn get_supplier(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Supplier>> {
    state
        .db
        .suppliers()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::not_found("Supplier", &id).into())
}

/// DELETE /suppliers/{id}
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    soft_delete(&state, ItemType::Supplier, &id, &body).await
}

/// GET /suppliers/{id}/history
pub async fn supplier_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Statement>> {
    Ok(Json(state.db.ledger().supplier_statement(&id).await?))
}

/// POST /suppliers/{id}/payments
pub async fn supplier_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let Json(new) = body?;
    let payment = state.db.ledger().record_supplier_payment(&id, new).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /suppliers/{id}/purchases
pub async fn supplier_purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewPurchase>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Purchase>)> {
    let Json(new) = body?;
    let purchase = state.db.ledger().record_purchase(&id, new).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
