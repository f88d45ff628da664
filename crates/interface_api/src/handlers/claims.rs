//! Claims handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, SessionContext};
use domain_claims::adapters::PrecomputedScoring;
use domain_claims::projection::MatchedAnalysis;
use domain_claims::{
    match_analysis, Claim, ClaimError, ClaimIntakeService, DocumentStore, ListQuery, RecordRef,
    ReviewAction,
};

use crate::auth::{permissions, require_role, TokenClaims};
use crate::dto::claims::*;
use crate::dto::review::{ReviewBody, ReviewResponse};
use crate::{error::ApiError, AppState};

/// Submits a new claim
///
/// The request carries the scoring pipeline's verdict when it produced one.
/// Without it the claim is stored and routed to manual review.
pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<(StatusCode, Json<SubmitClaimResponse>), ApiError> {
    require_role(&claims, permissions::CLAIM_SUBMIT)?;
    request.validate()?;

    let (submission, verdict) = request.into_parts();
    let intake = ClaimIntakeService::new(
        Arc::clone(&state.store),
        Arc::new(PrecomputedScoring::from_option(verdict)),
    )
    .with_timeout(state.config.pipeline_timeout());

    let outcome = intake.submit(&session, submission).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Lists claims, newest first
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    require_role(&claims, permissions::CLAIM_READ)?;
    let query = ListQuery::try_from(params)?;
    Ok(Json(state.store.list_claims(query).await?))
}

/// Gets a claim with its reconciled analysis
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<String>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    require_role(&claims, permissions::CLAIM_READ)?;

    let claim = state
        .store
        .get_claim(&ClaimId::new(id.as_str()))
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ClaimError::ClaimNotFound(id.clone()),
            other => ClaimError::Persistence(other),
        })?;

    let analyses = state.store.list_analyses(ListQuery::default()).await?;
    let analysis = match_analysis(&claim, &analyses).map(MatchedAnalysis::from);

    Ok(Json(ClaimDetailResponse { claim, analysis }))
}

/// Approves a claim
pub async fn approve_claim(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<ReviewResponse>, ApiError> {
    review_claim(state, claims, session, id, body, ReviewAction::Approve).await
}

/// Rejects a claim; notes are required
pub async fn reject_claim(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<ReviewResponse>, ApiError> {
    review_claim(state, claims, session, id, body, ReviewAction::Reject).await
}

/// Flags a claim for manual review
pub async fn flag_claim(
    state: State<AppState>,
    claims: Extension<TokenClaims>,
    session: Extension<SessionContext>,
    id: Path<String>,
    body: ReviewBody,
) -> Result<Json<ReviewResponse>, ApiError> {
    review_claim(state, claims, session, id, body, ReviewAction::FlagForReview).await
}

async fn review_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: ReviewBody,
    action: ReviewAction,
) -> Result<Json<ReviewResponse>, ApiError> {
    require_role(&claims, permissions::CLAIM_REVIEW)?;
    let ReviewBody(request) = body;
    request.validate()?;

    let record = RecordRef::claim(&ClaimId::new(id));
    let outcome = state
        .reviews
        .apply_transition(&session, &record, action, request.notes.as_deref())
        .await?;

    Ok(Json(outcome.into()))
}
