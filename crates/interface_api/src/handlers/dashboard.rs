//! Dashboard handler

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use domain_claims::DashboardView;

use crate::auth::{permissions, require_role, TokenClaims};
use crate::dto::dashboard::DashboardParams;
use crate::{error::ApiError, AppState};

/// Returns the live dashboard view
///
/// The search term and status filter apply to this response only; the shared
/// board keeps an unfiltered view.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardView>, ApiError> {
    require_role(&claims, permissions::CLAIM_READ)?;
    let filter = params.status_filter()?;

    let view = state
        .board
        .read()
        .await
        .narrowed_view(filter, params.search_term());

    Ok(Json(view))
}
