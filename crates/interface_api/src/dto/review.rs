//! Review action DTOs

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_claims::{ClaimError, RecordRef, ReviewOutcome, ReviewStatus};

use crate::error::ApiError;

/// Body of approve, reject and flag requests
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ReviewRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Also apply the decision to the claim reconciled with this analysis
    pub include_claim: bool,
}

/// Optional review body
///
/// An empty body means the defaults. A body that is present must be JSON and
/// must parse; anything else is rejected instead of being dropped.
#[derive(Debug, Default)]
pub struct ReviewBody(pub ReviewRequest);

#[async_trait]
impl<S> FromRequest<S> for ReviewBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        if !json {
            return Err(ApiError::BadRequest(
                "Review body must be sent as application/json".to_string(),
            ));
        }

        let Json(request) = Json::<ReviewRequest>::from_bytes(&bytes)
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(request))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| {
            let essence = essence.trim();
            essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub collection: String,
    pub id: String,
    pub previous_status: ReviewStatus,
    pub status: ReviewStatus,
    pub review_notes: Option<String>,
    pub reviewed_by: String,
    pub reviewed_at: DateTime<Utc>,
}

impl From<ReviewOutcome> for ReviewResponse {
    fn from(outcome: ReviewOutcome) -> Self {
        let RecordRef { collection, id } = outcome.record;
        Self {
            collection: collection.as_str().to_string(),
            id,
            previous_status: outcome.previous,
            status: outcome.update.status,
            review_notes: outcome.update.review_notes,
            reviewed_by: outcome.update.reviewed_by,
            reviewed_at: outcome.update.reviewed_at,
        }
    }
}

/// Outcome of the claim half of a paired review
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PairedClaimResult {
    Applied(ReviewResponse),
    Failed { error: String },
}

/// Response of a review on an analysis and, optionally, its claim
#[derive(Debug, Serialize)]
pub struct PairedReviewResponse {
    pub analysis: ReviewResponse,
    /// Absent when the claim was not requested or none reconciles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<PairedClaimResult>,
}

impl PairedReviewResponse {
    pub fn new(analysis: ReviewOutcome, claim: Option<Result<ReviewOutcome, ClaimError>>) -> Self {
        Self {
            analysis: analysis.into(),
            claim: claim.map(|result| match result {
                Ok(outcome) => PairedClaimResult::Applied(outcome.into()),
                Err(e) => PairedClaimResult::Failed { error: e.to_string() },
            }),
        }
    }
}
