/**
 * Server Configuration
 *
 * This module handles loading of server configuration from environment
 * variables, and the optional PostgreSQL connection.
 *
 * # Environment
 *
 * - `SERVER_HOST` (default `0.0.0.0`)
 * - `SERVER_PORT` (default `3000`)
 * - `DATABASE_URL` (optional; without it the server keeps messages in memory)
 * - `DATABASE_MAX_CONNECTIONS` (default `5`)
 *
 * # Error Handling
 *
 * Malformed numbers are rejected. A database that cannot be reached is
 * logged and the server continues with in-memory components.
 */

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Errors raised while reading the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerConfigError {
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let host = std::env::var("SERVER_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_var("SERVER_PORT", DEFAULT_PORT)?;
        let database_url = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty());
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
        })
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ServerConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ServerConfigError::InvalidNumber { name, value }),
        _ => Ok(default),
    }
}

/// Connect to PostgreSQL and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is configured and reachable
/// - `None` if `DATABASE_URL` is unset or the connection fails
///
/// # Errors
///
/// Errors are logged but do not prevent server startup.
pub async fn load_database(config: &ServerConfig) -> Option<PgPool> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Messages will be kept in memory.");
        return None;
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to in-memory storage.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = ["SERVER_HOST", "SERVER_PORT", "DATABASE_URL", "DATABASE_MAX_CONNECTIONS"];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_environment() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    #[serial]
    fn test_reads_environment() {
        clear_env();
        std::env::set_var("SERVER_HOST", "127.0.0.1");
        std::env::set_var("SERVER_PORT", "8080");
        std::env::set_var("DATABASE_URL", "postgres://localhost/campus");
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "12");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/campus"));
        assert_eq!(config.database_max_connections, 12);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_bad_port() {
        clear_env();
        std::env::set_var("SERVER_PORT", "eighty");
        assert_eq!(
            ServerConfig::from_env().unwrap_err(),
            ServerConfigError::InvalidNumber {
                name: "SERVER_PORT",
                value: "eighty".to_string()
            }
        );
        clear_env();
    }

    #[tokio::test]
    async fn test_no_database_url_means_memory() {
        assert!(load_database(&ServerConfig::default()).await.is_none());
    }
}
