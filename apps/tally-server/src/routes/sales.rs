//! Sale endpoints. All pricing and stock work happens in [`tally_db::SaleEngine`].

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{CustomerType, ItemType, Sale, SaleItem};
use tally_db::{SaleDetail, SaleEdit, SaleReceipt, SaleRequest};

use super::archive::{soft_delete, ArchivedRef};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

/// Body of `201 Created` for a new sale.
#[derive(Debug, Serialize)]
pub struct SaleCreated {
    pub sale_id: String,
    pub customer_type: CustomerType,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub discount_amount_cents: i64,
    pub total_amount_cents: i64,
    pub items: Vec<SaleItem>,
    pub created_at: DateTime<Utc>,
}

impl From<SaleReceipt> for SaleCreated {
    fn from(receipt: SaleReceipt) -> Self {
        let SaleReceipt { sale, items } = receipt;
        SaleCreated {
            sale_id: sale.id,
            customer_type: sale.customer_type,
            customer_id: sale.customer_id,
            subtotal_cents: sale.subtotal_cents,
            discount_amount_cents: sale.discount_amount_cents,
            total_amount_cents: sale.total_amount_cents,
            items,
            created_at: sale.created_at,
        }
    }
}

/// POST /sales
pub async fn create_sale(
    State(state): State<AppState>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleCreated>)> {
    let Json(request) = body?;
    let receipt = state.db.engine().create_sale(request).await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /sales?limit=
pub async fn list_sales(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(params) = params?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(state.db.sales().list(limit).await?))
}

/// GET /sales/{id}
pub async fn get_sale(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db.engine().get_sale_detail(&id).await?))
}

/// PUT /sales/{id}
pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SaleEdit>, JsonRejection>,
) -> ApiResult<Json<SaleDetail>> {
    let Json(edit) = body?;
    Ok(Json(state.db.engine().update_sale(&id, edit).await?))
}

/// DELETE /sales/{id}
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    soft_delete(&state, ItemType::Sale, &id, &body).await
}
