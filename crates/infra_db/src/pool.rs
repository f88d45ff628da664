//! PostgreSQL pool for the document store
//!
//! Every change-feed subscription keeps one pooled connection for as long as
//! it is open, so `max_connections` has to leave room for the two live feeds
//! on top of request traffic.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use crate::error::DatabaseError;

/// Reported in `pg_stat_activity.application_name`
pub const DEFAULT_APPLICATION_NAME: &str = "review-desk";

/// Connection settings for [`create_pool`]
///
/// ```rust
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://localhost/review_desk")
///     .max_connections(20)
///     .run_migrations(false);
/// assert_eq!(config.max_connections, 20);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub application_name: String,
    /// Apply the embedded migrations after connecting
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        PgConnectOptions::from_str(&self.url)
            .map(|options| options.application_name(&self.application_name))
            .map_err(|e| DatabaseError::ConnectionFailed(format!("invalid database url: {}", e)))
    }
}

/// Connects and, unless disabled, brings the schema up to date
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let options = config.connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(
        application = %config.application_name,
        max_connections = config.max_connections,
        "Document store pool ready"
    );

    if config.run_migrations {
        run_migrations(&pool).await?;
    }
    Ok(pool)
}

/// Applies the `documents` and `review_events` schema
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Document store migrations applied");
    Ok(())
}
