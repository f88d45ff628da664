//! Claims and analyses DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_claims::claim::{ClaimAmounts, IncidentDetails, InsuredDetails, PolicyDetails, VehicleDetails};
use domain_claims::intake::AttachmentRef;
use domain_claims::projection::MatchedAnalysis;
use domain_claims::{
    Claim, ClaimSubmission, ColorToken, FraudAnalysis, IntakeOutcome, ListQuery, PipelineResult, ReviewStatus,
    RiskTier,
};

use crate::error::ApiError;

/// Upper bound on `limit` for list endpoints
pub const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitClaimRequest {
    #[validate(length(min = 1, max = 64))]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub policy: PolicyDetails,
    #[serde(default)]
    pub insured: InsuredDetails,
    #[serde(default)]
    pub vehicle: VehicleDetails,
    #[serde(default)]
    pub incident: IncidentDetails,
    #[serde(default)]
    pub amounts: ClaimAmounts,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub attachment: Option<AttachmentRef>,
    /// Verdict the scoring pipeline already produced for this submission;
    /// absent means scoring failed and the claim goes to manual review
    pub pipeline_result: Option<PipelineResult>,
}

impl SubmitClaimRequest {
    pub fn into_parts(self) -> (ClaimSubmission, Option<PipelineResult>) {
        let submission = ClaimSubmission {
            policy_number: self.policy_number,
            policy: self.policy,
            insured: self.insured,
            vehicle: self.vehicle,
            incident: self.incident,
            amounts: self.amounts,
            description: self.description,
            attachment: self.attachment,
        };
        (submission, self.pipeline_result)
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitClaimResponse {
    pub claim: Claim,
    pub analysis: FraudAnalysis,
    pub combined_score: f64,
    pub tier: RiskTier,
    pub degraded: bool,
}

impl From<IntakeOutcome> for SubmitClaimResponse {
    fn from(outcome: IntakeOutcome) -> Self {
        Self {
            combined_score: outcome.analysis.combined_percent(),
            tier: outcome.analysis.tier(),
            claim: outcome.claim,
            analysis: outcome.analysis,
            degraded: outcome.degraded,
        }
    }
}

/// Query string of the list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub policy_number: Option<String>,
    pub email: Option<String>,
    pub limit: Option<u32>,
}

impl TryFrom<ListParams> for ListQuery {
    type Error = ApiError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ReviewStatus>)
            .transpose()?;

        if let Some(limit) = params.limit {
            if limit == 0 || limit > MAX_PAGE_SIZE {
                return Err(ApiError::BadRequest(format!(
                    "limit must be between 1 and {}",
                    MAX_PAGE_SIZE
                )));
            }
        }

        Ok(ListQuery {
            status,
            policy_number: params.policy_number,
            email: params.email,
            limit: params.limit,
        })
    }
}

/// A claim with its reconciled analysis
#[derive(Debug, Serialize)]
pub struct ClaimDetailResponse {
    pub claim: Claim,
    /// `null` when no analysis reconciles with the claim
    pub analysis: Option<MatchedAnalysis>,
}

/// An analysis with its derived priority
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: FraudAnalysis,
    pub combined_score: f64,
    pub tier: RiskTier,
    pub risk_color: ColorToken,
    pub risk_color_hex: &'static str,
}

impl From<FraudAnalysis> for AnalysisResponse {
    fn from(analysis: FraudAnalysis) -> Self {
        Self {
            combined_score: analysis.combined_percent(),
            tier: analysis.tier(),
            risk_color: analysis.risk_level.color(),
            risk_color_hex: analysis.risk_level.color().hex(),
            analysis,
        }
    }
}
