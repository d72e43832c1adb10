//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: &'static str,
    pub database: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations_current: Option<bool>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    let migrations_current = if database {
        state.db.migration_status().await.ok().map(|s| s.is_current())
    } else {
        None
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        migrations_current,
    })
}
