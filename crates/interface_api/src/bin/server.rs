//! Review Desk - API Server Binary
//!
//! Starts the HTTP API of the fraud review desk.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store, for local development
//! cargo run --bin review-desk-api
//!
//! # PostgreSQL store
//! API_DATABASE_URL=postgres://... cargo run --bin review-desk-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string; unset selects the in-memory store
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_PIPELINE_TIMEOUT_MS` - Bound on one scoring pipeline call (default: 30000)
//! * `API_ENFORCE_TERMINAL_STATES` - Refuse changes to approved or rejected records (default: true)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::adapters::InMemoryDocumentStore;
use domain_claims::DocumentStore;
use infra_db::{DatabaseConfig, PostgresDocumentStore};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        enforce_terminal_states = config.enforce_terminal_states,
        "Starting Review Desk API Server"
    );

    let store = connect_store(&config).await?;
    let state = AppState::new(store, config.clone())
        .await
        .context("failed to attach change feeds")?;
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse().context("invalid server address")?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Opens the configured document store; migrations run on connect
async fn connect_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db_config = DatabaseConfig::new(url.as_str()).run_migrations(true);
            let store = PostgresDocumentStore::connect_with(db_config)
                .await
                .context("failed to connect to the document store")?;
            tracing::info!("Database ready");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("API_DATABASE_URL not set; using the in-memory store, data is lost on exit");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
