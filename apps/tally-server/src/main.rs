//! # Tally Server
//!
//! HTTP/JSON front for the sale engine, ledger and archive.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Tally Server                                 │
//! │                                                                         │
//! │  Till / back office ───► HTTP (8080) ───► Routes ───► SaleEngine        │
//! │                                              │          StockLedger     │
//! │                                              │          Ledger          │
//! │                                              ▼                          │
//! │                                     SoftDeleteArchive ───► SQLite (WAL) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tally_db::{Database, DbConfig};
use tally_server::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // TALLY_LOG wins over RUST_LOG
    let filter = EnvFilter::try_from_env("TALLY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Tally server...");

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        addr = %config.socket_addr(),
        database = %config.database_path.display(),
        max_connections = config.db_max_connections,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path).max_connections(config.db_max_connections))
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    if db.users().find_by_username(&config.owner_username).await?.is_none() {
        warn!(
            owner = %config.owner_username,
            "Owner account not found; destructive operations will be refused until it is seeded"
        );
    }

    let state = AppState::new(db.clone(), &config.owner_username);
    let app = tally_server::app(state);

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;
    info!(addr = %config.socket_addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
