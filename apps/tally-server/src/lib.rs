//! # Tally Server
//!
//! HTTP/JSON API over the sale engine, the ledger and the archive.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Server                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /sales        │  │  /customers    │  │  /deleted-items            ││
//! │  │                │  │  /suppliers    │  │                            ││
//! │  │ • create       │  │ • history      │  │ • list / get               ││
//! │  │ • edit         │  │ • payments     │  │ • restore                  ││
//! │  │ • detail       │  │ • purchases    │  │ • purge                    ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │          │                   │                        │                 │
//! │          ▼                   ▼                        ▼                 │
//! │     SaleEngine        LedgerRepository        SoftDeleteArchive        │
//! │                                                  (password gate)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `TALLY_HTTP_PORT` - HTTP port (default: 8080)
//! - `TALLY_BIND_ADDR` - Bind address (default: 0.0.0.0)
//! - `TALLY_DATABASE_PATH` - SQLite file (default: ./tally.db)
//! - `TALLY_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `TALLY_OWNER_USERNAME` - Owner account for destructive operations (default: owner)
//! - `TALLY_LOG` / `RUST_LOG` - Log filter (default: info)

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full router with tracing.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
