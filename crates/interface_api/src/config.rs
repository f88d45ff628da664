//! API configuration

use serde::Deserialize;
use std::time::Duration;

use domain_claims::review::ReviewPolicy;

/// API configuration
///
/// Loaded from `API_`-prefixed environment variables, e.g. `API_PORT=9090` or
/// `API_DATABASE_URL=postgres://...`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// PostgreSQL URL; the in-memory store is used when absent
    #[serde(default)]
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,
    /// Upper bound on one scoring pipeline call
    pub pipeline_timeout_ms: u64,
    /// Refuse transitions out of Approved and Rejected
    pub enforce_terminal_states: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: None,
            log_level: "info".to_string(),
            pipeline_timeout_ms: 30_000,
            enforce_terminal_states: true,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment, filling unset keys with defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("pipeline_timeout_ms", defaults.pipeline_timeout_ms)?
            .set_default("enforce_terminal_states", defaults.enforce_terminal_states)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline_timeout_ms)
    }

    pub fn review_policy(&self) -> ReviewPolicy {
        if self.enforce_terminal_states {
            ReviewPolicy::default()
        } else {
            ReviewPolicy::ui_only()
        }
    }
}
