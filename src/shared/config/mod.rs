//! Client configuration module
//!
//! Provides configuration for a client session: where the server lives and
//! how loosely an id-less echo may match an optimistic message.

use thiserror::Error;

/// Default tolerance between a local optimistic timestamp and the server's
pub const DEFAULT_RECONCILE_WINDOW_SECS: i64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the messaging server, e.g. `http://127.0.0.1:3000`
    pub server_url: String,
    /// Maximum clock distance for heuristic echo matching
    pub reconcile_window_secs: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            reconcile_window_secs: DEFAULT_RECONCILE_WINDOW_SECS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.reconcile_window_secs <= 0 {
            return Err(ConfigError::InvalidValue("reconcile_window_secs"));
        }
        Ok(())
    }

    /// WebSocket URL derived from the server URL
    pub fn socket_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{ws}/ws")
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    reconcile_window_secs: Option<i64>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the heuristic reconciliation window
    pub fn reconcile_window_secs(mut self, secs: i64) -> Self {
        self.reconcile_window_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self.server_url.ok_or(ConfigError::MissingValue("server_url"))?,
            reconcile_window_secs: self
                .reconcile_window_secs
                .unwrap_or(DEFAULT_RECONCILE_WINDOW_SECS),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_window() {
        let config = AppConfig::builder()
            .server_url("http://localhost:3000")
            .build()
            .unwrap();
        assert_eq!(config.reconcile_window_secs, DEFAULT_RECONCILE_WINDOW_SECS);
        assert_eq!(config.socket_url(), "ws://localhost:3000/ws");
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert_eq!(
            AppConfig::builder().build().unwrap_err(),
            ConfigError::MissingValue("server_url")
        );
        assert!(matches!(
            AppConfig::builder().server_url("localhost").build(),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert_eq!(
            AppConfig::builder()
                .server_url("https://dm.example.edu/")
                .reconcile_window_secs(0)
                .build()
                .unwrap_err(),
            ConfigError::InvalidValue("reconcile_window_secs")
        );
    }

    #[test]
    fn test_secure_socket_url() {
        let config = AppConfig::builder().server_url("https://dm.example.edu/").build().unwrap();
        assert_eq!(config.socket_url(), "wss://dm.example.edu/ws");
    }
}
