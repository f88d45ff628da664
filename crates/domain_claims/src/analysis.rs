//! Fraud analysis record
//!
//! Written by the scoring pipeline (or by intake on its behalf) and keyed
//! independently of the claim it describes. The association with a claim is
//! recovered by the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::AnalysisId;
use crate::risk::{classify, RiskLevel, RiskTier};
use crate::status::ReviewStatus;

/// Scale the numeric fields of a [`ScoreCard`] are expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// As produced by the pipeline: probabilities and confidences in [0,1],
    /// scores in [0,100]
    #[default]
    Native,
    /// Every field is a percentage in [0,100]
    Percent,
}

/// Sub-scores produced by the three scoring stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCard {
    pub rule_based_score: Option<f64>,
    pub ml_probability: Option<f64>,
    pub ml_confidence: Option<f64>,
    pub ml_prediction: Option<String>,
    pub ai_fraud_score: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub combined_score: Option<f64>,
    pub scale: ScoreScale,
}

/// Action suggested by the AI reasoning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AiAction {
    Accept,
    RequestDocuments,
    #[default]
    EscalateInvestigation,
    Reject,
    FinalDecision,
    Other(String),
}

impl AiAction {
    pub fn as_str(&self) -> &str {
        match self {
            AiAction::Accept => "accept",
            AiAction::RequestDocuments => "request_documents",
            AiAction::EscalateInvestigation => "escalate_investigation",
            AiAction::Reject => "reject",
            AiAction::FinalDecision => "final_decision",
            AiAction::Other(raw) => raw,
        }
    }
}

impl From<String> for AiAction {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => AiAction::Accept,
            "request_documents" => AiAction::RequestDocuments,
            "escalate_investigation" => AiAction::EscalateInvestigation,
            "reject" => AiAction::Reject,
            "final_decision" => AiAction::FinalDecision,
            _ => AiAction::Other(raw),
        }
    }
}

impl From<AiAction> for String {
    fn from(action: AiAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrative output of the AI reasoning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiAssessment {
    pub action: AiAction,
    pub reasoning: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingMetadata {
    pub method: Option<String>,
    pub model_version: Option<String>,
    pub duration_ms: Option<u64>,
}

/// A fraud analysis of one claim submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAnalysis {
    pub analysis_id: AnalysisId,
    #[serde(default)]
    pub claim_reference: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_display_name: Option<String>,
    #[serde(default)]
    pub scores: ScoreCard,
    #[serde(default)]
    pub ai: AiAssessment,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub processing: ProcessingMetadata,
    pub status: ReviewStatus,
    /// Set when scoring failed and this is a placeholder
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub review_notes: Option<String>,
}

impl FraudAnalysis {
    /// Creates an empty analysis awaiting review
    pub fn new(analysis_id: AnalysisId, created_at: DateTime<Utc>) -> Self {
        Self {
            analysis_id,
            claim_reference: None,
            policy_number: None,
            user_email: None,
            user_display_name: None,
            scores: ScoreCard::default(),
            ai: AiAssessment::default(),
            risk_level: RiskLevel::default(),
            risk_factors: Vec::new(),
            red_flags: Vec::new(),
            recommendations: Vec::new(),
            follow_up_questions: Vec::new(),
            processing: ProcessingMetadata::default(),
            status: ReviewStatus::UnderReview,
            error: None,
            created_at,
            analyzed_at: None,
            updated_at: created_at,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        }
    }

    /// Combined score as a percentage in [0,100]
    pub fn combined_percent(&self) -> f64 {
        crate::scoring::normalize(&self.scores)
            .combined_score
            .unwrap_or(0.0)
    }

    /// Priority tier of the combined score
    pub fn tier(&self) -> RiskTier {
        classify(self.combined_percent())
    }

    /// Whether this is a placeholder written after a scoring failure
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    pub fn policy_key(&self) -> Option<&str> {
        non_blank(self.policy_number.as_deref())
    }

    pub fn claim_reference_key(&self) -> Option<&str> {
        non_blank(self.claim_reference.as_deref())
    }
}

/// Blank keys are absent; others are compared exactly as stored
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
