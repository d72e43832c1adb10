//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::Serialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// HTTP port (`TALLY_HTTP_PORT`, default 8080)
    pub http_port: u16,

    /// Bind address (`TALLY_BIND_ADDR`, default 0.0.0.0)
    pub bind_addr: IpAddr,

    /// SQLite file (`TALLY_DATABASE_PATH`, default ./tally.db)
    pub database_path: PathBuf,

    /// Pool size (`TALLY_DB_MAX_CONNECTIONS`, default 5)
    pub db_max_connections: u32,

    /// Account whose password gates destructive operations
    /// (`TALLY_OWNER_USERNAME`, default "owner")
    pub owner_username: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: parse_or(&lookup, "TALLY_HTTP_PORT", 8080)?,
            bind_addr: parse_or(&lookup, "TALLY_BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?,
            database_path: lookup("TALLY_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./tally.db")),
            db_max_connections: parse_or(&lookup, "TALLY_DB_MAX_CONNECTIONS", 5)?,
            owner_username: lookup("TALLY_OWNER_USERNAME")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "owner".to_string()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.owner_username.is_empty() {
            return Err(ConfigError::MissingRequired("TALLY_OWNER_USERNAME".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
