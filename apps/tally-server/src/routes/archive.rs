//! Archive endpoints, plus the shared soft-delete handler used by the
//! `DELETE /{entity}/{id}` routes.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::{DeletedItem, ItemType};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `{ "password": "..." }`; an empty body counts as no password.
#[derive(Debug, Default, Deserialize)]
struct PasswordBody {
    #[serde(default)]
    password: Option<String>,
}

fn password_from(body: &Bytes) -> ApiResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let parsed: PasswordBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e)))?;
    Ok(parsed.password)
}

/// Returned by every soft delete.
#[derive(Debug, Serialize)]
pub struct ArchivedRef {
    pub archive_id: String,
    pub item_type: ItemType,
    pub original_id: String,
}

pub(crate) async fn soft_delete(
    state: &AppState,
    item_type: ItemType,
    id: &str,
    body: &Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    let password = password_from(body)?;
    let record = state
        .archive
        .soft_delete(item_type, id, password.as_deref())
        .await?;

    Ok(Json(ArchivedRef {
        archive_id: record.id,
        item_type: record.item_type,
        original_id: record.original_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ArchiveFilter {
    #[serde(default)]
    pub item_type: Option<String>,
}

/// GET /deleted-items?item_type=
pub async fn list_deleted(
    State(state): State<AppState>,
    filter: Result<Query<ArchiveFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<DeletedItem>>> {
    let Query(filter) = filter?;
    let item_type = match filter.item_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<ItemType>()?),
    };
    Ok(Json(state.archive.list(item_type).await?))
}

/// GET /deleted-items/{id}
pub async fn get_deleted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedItem>> {
    Ok(Json(state.archive.get(&id).await?))
}

/// POST /deleted-items/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    let password = password_from(&body)?;
    let record = state.archive.restore(&id, password.as_deref()).await?;
    Ok(Json(ArchivedRef {
        archive_id: record.id,
        item_type: record.item_type,
        original_id: record.original_id,
    }))
}

/// DELETE /deleted-items/{id}
pub async fn purge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ArchivedRef>> {
    let password = password_from(&body)?;
    let record = state.archive.purge(&id, password.as_deref()).await?;
    Ok(Json(ArchivedRef {
        archive_id: record.id,
        item_type: record.item_type,
        original_id: record.original_id,
    }))
}
