//! Claim intake
//!
//! Turns a submission and the scoring pipeline's verdict into a persisted
//! claim and a persisted analysis. A pipeline failure or timeout never loses
//! the submission: a placeholder analysis is written instead and both records
//! are routed to manual review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use core_kernel::{AnalysisId, ClaimId, SessionContext};

use crate::analysis::{AiAction, AiAssessment, FraudAnalysis, ProcessingMetadata, ScoreCard};
use crate::claim::{
    Claim, ClaimAmounts, ClaimantRef, IncidentDetails, InsuredDetails, PolicyDetails, VehicleDetails,
};
use crate::error::ClaimError;
use crate::ports::{DocumentStore, ScoringPipeline};
use crate::reconcile::CLAIM_ID_PREFIX_LEN;
use crate::risk::RiskLevel;
use crate::scoring::combine;
use crate::status::ReviewStatus;

/// Default bound on a scoring pipeline call
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Explanation recorded on a degraded analysis
pub const DEGRADED_EXPLANATION: &str = "Failed to analyze claim with AI";

/// Reference to an uploaded attachment; the upload itself happens elsewhere
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentRef {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub url: Option<String>,
}

/// A claim as submitted by a claimant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimSubmission {
    pub policy_number: Option<String>,
    pub policy: PolicyDetails,
    pub insured: InsuredDetails,
    pub vehicle: VehicleDetails,
    pub incident: IncidentDetails,
    pub amounts: ClaimAmounts,
    pub description: Option<String>,
    pub attachment: Option<AttachmentRef>,
}

impl ClaimSubmission {
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.amounts.has_negative() {
            return Err(ClaimError::validation("claim amounts cannot be negative"));
        }
        if let Some(hour) = self.incident.hour_of_day {
            if hour > 23 {
                return Err(ClaimError::validation("incident hour must be between 0 and 23"));
            }
        }
        let policy_amounts = [
            self.policy.deductible,
            self.policy.annual_premium,
            self.policy.umbrella_limit,
        ];
        if policy_amounts.iter().flatten().any(|a| a.is_sign_negative() && !a.is_zero()) {
            return Err(ClaimError::validation("policy amounts cannot be negative"));
        }
        if let Some(policy) = &self.policy_number {
            if policy.len() > 64 {
                return Err(ClaimError::validation("policy number is too long"));
            }
        }
        Ok(())
    }
}

/// ML classifier output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierResult {
    pub fraud_probability: f64,
    pub prediction: Option<String>,
    pub confidence: Option<f64>,
}

/// Rules-plus-classifier stage of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridResult {
    /// Combined score, percent
    pub fraud_score: Option<f64>,
    pub risk_level: Option<String>,
    pub reasons: Vec<String>,
    pub rule_based_score: Option<f64>,
    pub catboost_result: ClassifierResult,
}

/// Generative-AI reasoning stage of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiCheck {
    pub action: Option<String>,
    pub reasoning: Option<String>,
    pub confidence_score: Option<f64>,
    pub fraud_score: Option<f64>,
    pub red_flags: Vec<String>,
    pub recommendation: Option<String>,
    pub follow_up_questions: Vec<String>,
    pub explanation: Option<String>,
}

/// Everything the pipeline reports about one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineResult {
    pub hybrid_result: HybridResult,
    pub ai_check: AiCheck,
}

impl PipelineResult {
    /// Combined score, derived from the sub-scores when the pipeline omits it
    pub fn combined_score(&self) -> Option<f64> {
        self.hybrid_result.fraud_score.or_else(|| {
            self.hybrid_result
                .rule_based_score
                .map(|rule| combine(rule, self.hybrid_result.catboost_result.fraud_probability))
        })
    }
}

/// Id of the analysis written for `claim_id`
///
/// Embeds the claim id prefix so the reconciler can pair the two even when the
/// submission carried no policy number.
pub fn analysis_id_for(claim_id: &ClaimId) -> AnalysisId {
    let suffix = AnalysisId::generate();
    AnalysisId::new(format!(
        "FA-{}-{}",
        claim_id.prefix(CLAIM_ID_PREFIX_LEN),
        suffix.prefix(8)
    ))
}

impl Claim {
    /// Builds the claim record for a submission
    pub fn from_submission(
        id: ClaimId,
        submission: &ClaimSubmission,
        session: &SessionContext,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut claim = Claim::new(id, submission.policy_number.clone(), created_at);
        claim.claimant = ClaimantRef::from(session);
        claim.policy = submission.policy.clone();
        claim.insured = submission.insured.clone();
        claim.vehicle = submission.vehicle.clone();
        claim.incident = submission.incident.clone();
        claim.amounts = submission.amounts.clone();
        claim.description = submission.description.clone();
        claim
    }
}

impl FraudAnalysis {
    /// Analysis built from a successful pipeline run
    pub fn from_pipeline(
        analysis_id: AnalysisId,
        claim: &Claim,
        result: &PipelineResult,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        let hybrid = &result.hybrid_result;
        let ai = &result.ai_check;
        let combined = result.combined_score();

        let mut analysis = FraudAnalysis::new(analysis_id, analyzed_at);
        analysis.claim_reference = claim.policy_number.clone();
        analysis.policy_number = claim.policy_number.clone();
        analysis.user_email = claim.claimant.email.clone();
        analysis.user_display_name = claim.claimant.display_name.clone();
        analysis.scores = ScoreCard {
            rule_based_score: hybrid.rule_based_score,
            ml_probability: Some(hybrid.catboost_result.fraud_probability),
            ml_confidence: hybrid.catboost_result.confidence,
            ml_prediction: hybrid.catboost_result.prediction.clone(),
            // The AI stage reports the combined score as its own
            ai_fraud_score: combined,
            ai_confidence: ai.confidence_score,
            combined_score: combined,
            ..ScoreCard::default()
        };
        analysis.ai = AiAssessment {
            action: ai
                .action
                .clone()
                .map(AiAction::from)
                .unwrap_or_default(),
            reasoning: ai.reasoning.clone(),
            explanation: ai.explanation.clone(),
        };
        analysis.risk_level = match (&hybrid.risk_level, hybrid.rule_based_score) {
            (Some(label), _) => RiskLevel::parse(label),
            (None, Some(rule)) => RiskLevel::from_rule_score(rule),
            (None, None) => RiskLevel::Pending,
        };
        analysis.risk_factors = hybrid.reasons.clone();
        analysis.red_flags = ai.red_flags.clone();
        analysis.recommendations = ai.recommendation.iter().cloned().collect();
        analysis.follow_up_questions = ai.follow_up_questions.clone();
        analysis.processing = ProcessingMetadata {
            method: Some("hybrid".to_string()),
            ..ProcessingMetadata::default()
        };
        analysis.analyzed_at = Some(analyzed_at);
        analysis
    }

    /// Placeholder written when the pipeline failed or timed out
    pub fn degraded(
        analysis_id: AnalysisId,
        claim: &Claim,
        failure: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut analysis = FraudAnalysis::new(analysis_id, created_at);
        analysis.claim_reference = claim.policy_number.clone();
        analysis.policy_number = claim.policy_number.clone();
        analysis.user_email = claim.claimant.email.clone();
        analysis.user_display_name = claim.claimant.display_name.clone();
        analysis.ai = AiAssessment {
            action: AiAction::EscalateInvestigation,
            reasoning: None,
            explanation: Some(DEGRADED_EXPLANATION.to_string()),
        };
        analysis.risk_level = RiskLevel::Pending;
        analysis.status = ReviewStatus::PendingManualReview;
        analysis.error = Some(failure.into());
        analysis
    }
}

/// Result of one submission
#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub claim: Claim,
    pub analysis: FraudAnalysis,
    /// Scoring failed and the analysis is a placeholder
    pub degraded: bool,
}

/// Accepts claim submissions
pub struct ClaimIntakeService {
    store: Arc<dyn DocumentStore>,
    pipeline: Arc<dyn ScoringPipeline>,
    timeout: Duration,
}

impl ClaimIntakeService {
    pub fn new(store: Arc<dyn DocumentStore>, pipeline: Arc<dyn ScoringPipeline>) -> Self {
        Self {
            store,
            pipeline,
            timeout: DEFAULT_PIPELINE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submits a claim for scoring and review
    ///
    /// # Arguments
    ///
    /// * `session` - The submitting user; must be resolved
    /// * `submission` - Claim details as entered
    ///
    /// # Returns
    ///
    /// The persisted claim and analysis. A pipeline failure is reported through
    /// `IntakeOutcome::degraded`, not as an error; only validation and store
    /// failures are errors.
    pub async fn submit(
        &self,
        session: &SessionContext,
        submission: ClaimSubmission,
    ) -> Result<IntakeOutcome, ClaimError> {
        session.ensure_resolved()?;
        submission.validate()?;

        let now = Utc::now();
        let claim_id = ClaimId::generate();
        let analysis_id = analysis_id_for(&claim_id);
        let mut claim = Claim::from_submission(claim_id, &submission, session, now);

        let scored = match tokio::time::timeout(self.timeout, self.pipeline.score(&submission)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "scoring pipeline timed out after {}ms",
                self.timeout.as_millis()
            )),
        };

        let (analysis, degraded) = match scored {
            Ok(result) => (
                FraudAnalysis::from_pipeline(analysis_id, &claim, &result, Utc::now()),
                false,
            ),
            Err(failure) => {
                warn!(claim_id = %claim.id, error = %failure, "Scoring failed, writing degraded analysis");
                claim.status = ReviewStatus::PendingManualReview;
                (FraudAnalysis::degraded(analysis_id, &claim, failure, Utc::now()), true)
            }
        };

        self.store.create_claim(&claim).await?;
        self.store.create_analysis(&analysis).await?;

        info!(
            claim_id = %claim.id,
            analysis_id = %analysis.analysis_id,
            combined = analysis.combined_percent(),
            degraded,
            "Claim submitted"
        );

        Ok(IntakeOutcome {
            claim,
            analysis,
            degraded,
        })
    }
}
