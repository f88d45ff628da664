//! Fraud analysis handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use validator::Validate;

use core_kernel::{AnalysisId, SessionContext};
use domain_claims::{ClaimError, DocumentStore, ListQuery, RecordRef, ReviewAction};

use crate::auth::{permissions, require_role, TokenClaims};
use crate::dto::claims::{AnalysisResponse, ListParams};
use crate::dto::review::{PairedReviewResponse, ReviewBody};
use crate::{error::ApiError, AppState};

/// Lists analyses, newest first
pub async fn list_analyses(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AnalysisResponse>>, ApiError> {
    require_role(&claims, permissions::CLAIM_READ)?;
    let query = ListQuery::try_from(params)?;
    let analyses = state.store.list_analyses(query).await?;
    Ok(Json(analyses.into_iter().map(AnalysisResponse::from).collect()))
}

/// Gets an analysis by id
pub async fn get_analysis(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    require_role(&claims, permissions::CLAIM_READ)?;
    let analysis = state
        .store
        .get_analysis(&AnalysisId::new(id.as_str()))
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ClaimError::AnalysisNotFound(id.clone()),
            other => ClaimError::Persistence(other),
        })?;
    Ok(Json(analysis.into()))
}

pub async fn approve_analysis(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<PairedReviewResponse>, ApiError> {
    review_analysis(state, claims, session, id, body, ReviewAction::Approve).await
}

pub async fn reject_analysis(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<PairedReviewResponse>, ApiError> {
    review_analysis(state, claims, session, id, body, ReviewAction::Reject).await
}

pub async fn flag_analysis(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<PairedReviewResponse>, ApiError> {
    review_analysis(state, claims, session, id, body, ReviewAction::FlagForReview).await
}

/// Applies a disposition to an analysis
///
/// With `include_claim` the reconciled claim receives the same decision. The
/// claim write is independent: its failure is reported in the response and
/// does not undo the analysis write.
async fn review_analysis(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: ReviewBody,
    action: ReviewAction,
) -> Result<Json<PairedReviewResponse>, ApiError> {
    require_role(&claims, permissions::CLAIM_REVIEW)?;
    let ReviewBody(request) = body;
    request.validate()?;

    let record = RecordRef::analysis(&AnalysisId::new(id));
    let notes = request.notes.as_deref();

    let response = if request.include_claim {
        let (analysis, claim) = state.reviews.review_pair(&session, &record, action, notes).await?;
        PairedReviewResponse::new(analysis, claim)
    } else {
        let analysis = state
            .reviews
            .apply_transition(&session, &record, action, notes)
            .await?;
        PairedReviewResponse::new(analysis, None)
    };

    Ok(Json(response))
}
