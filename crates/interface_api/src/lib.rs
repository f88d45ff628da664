//! HTTP API Layer
//!
//! REST API of the fraud review desk using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: dashboard, claim intake and listing, review actions
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! The process keeps one [`SharedBoard`] attached to the store's change feeds.
//! Review actions show on that board before the store confirms them.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, config).await?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};
use tracing::warn;

use core_kernel::PortError;
use domain_claims::{DocumentStore, LiveBoard, ReviewService, SharedBoard};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{analyses, claims, dashboard, health};

/// Both collections have delivered their initial snapshot
const INITIAL_SNAPSHOT_REVISION: u64 = 2;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub reviews: ReviewService,
    pub board: SharedBoard,
    pub live: Arc<LiveBoard>,
    pub config: ApiConfig,
}

impl AppState {
    /// Attaches a live board to `store` and waits for the initial snapshots
    ///
    /// # Errors
    ///
    /// Returns the store's error if either change feed cannot be subscribed.
    pub async fn new(store: Arc<dyn DocumentStore>, config: ApiConfig) -> Result<Self, PortError> {
        let board = SharedBoard::default();
        let live = LiveBoard::attach(Arc::clone(&store), board.clone()).await?;

        if !board
            .wait_for_revision(INITIAL_SNAPSHOT_REVISION, Duration::from_secs(5))
            .await
        {
            warn!("Initial snapshots not received yet; dashboard starts empty");
        }

        let reviews = ReviewService::new(Arc::clone(&store))
            .with_board(board.clone())
            .with_policy(config.review_policy());

        Ok(Self {
            store,
            reviews,
            board,
            live: Arc::new(live),
            config,
        })
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Store, review service, live board and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", post(claims::submit_claim).get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id/approve", post(claims::approve_claim))
        .route("/:id/reject", post(claims::reject_claim))
        .route("/:id/flag", post(claims::flag_claim));

    let analyses_routes = Router::new()
        .route("/", get(analyses::list_analyses))
        .route("/:id", get(analyses::get_analysis))
        .route("/:id/approve", post(analyses::approve_analysis))
        .route("/:id/reject", post(analyses::reject_analysis))
        .route("/:id/flag", post(analyses::flag_analysis));

    // Protected API routes
    let api_routes = Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .nest("/claims", claims_routes)
        .nest("/analyses", analyses_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
