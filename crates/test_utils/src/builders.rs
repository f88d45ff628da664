//! Test Data Builders
//!
//! Builder patterns for claims and fraud analyses with sensible defaults.
//! Tests set only the fields they care about; names and emails are filled with
//! fake data.

use chrono::{DateTime, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;

use core_kernel::{AnalysisId, ClaimId};
use domain_claims::analysis::FraudAnalysis;
use domain_claims::claim::{Claim, ClaimAmounts};
use domain_claims::reconcile::CLAIM_ID_PREFIX_LEN;
use domain_claims::risk::RiskLevel;
use domain_claims::status::ReviewStatus;

use crate::fixtures::{AmountFixtures, TemporalFixtures};

/// Builder for claims
pub struct ClaimBuilder {
    id: ClaimId,
    policy_number: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    status: ReviewStatus,
    created_at: DateTime<Utc>,
    amounts: ClaimAmounts,
    description: Option<String>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    pub fn new() -> Self {
        Self {
            id: ClaimId::generate(),
            policy_number: None,
            email: Some(SafeEmail().fake()),
            display_name: Some(Name().fake()),
            status: ReviewStatus::UnderReview,
            created_at: TemporalFixtures::base_time(),
            amounts: AmountFixtures::collision(),
            description: Some("Rear-ended at a traffic light".to_string()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ClaimId::new(id);
        self
    }

    pub fn with_policy_number(mut self, policy_number: impl Into<String>) -> Self {
        self.policy_number = Some(policy_number.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Sets the creation time relative to the fixture base time
    pub fn created_minutes_after_base(self, minutes: i64) -> Self {
        self.created_at(TemporalFixtures::minutes_after_base(minutes))
    }

    pub fn with_amounts(mut self, amounts: ClaimAmounts) -> Self {
        self.amounts = amounts;
        self
    }

    pub fn build(self) -> Claim {
        let mut claim = Claim::new(self.id, self.policy_number, self.created_at);
        claim.claimant.email = self.email;
        claim.claimant.display_name = self.display_name;
        claim.status = self.status;
        claim.amounts = self.amounts;
        claim.description = self.description;
        claim
    }
}

/// Builder for fraud analyses
pub struct AnalysisBuilder {
    id: AnalysisId,
    policy_number: Option<String>,
    claim_reference: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    combined_score: Option<f64>,
    ml_probability: Option<f64>,
    risk_level: RiskLevel,
    status: ReviewStatus,
    created_at: DateTime<Utc>,
    error: Option<String>,
}

impl Default for AnalysisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisBuilder {
    pub fn new() -> Self {
        Self {
            id: AnalysisId::generate(),
            policy_number: None,
            claim_reference: None,
            email: Some(SafeEmail().fake()),
            display_name: Some(Name().fake()),
            combined_score: Some(35.0),
            ml_probability: Some(0.3),
            risk_level: RiskLevel::Low,
            status: ReviewStatus::UnderReview,
            created_at: TemporalFixtures::base_time(),
            error: None,
        }
    }

    /// Analysis the reconciler will pair with `claim` by policy number, or by
    /// id prefix when the claim has none
    pub fn for_claim(claim: &Claim) -> Self {
        let builder = Self::new()
            .with_id(format!("FA-{}-0001", claim.id.prefix(CLAIM_ID_PREFIX_LEN)))
            .created_at(claim.created_at);
        match claim.policy_number.clone() {
            Some(policy) => builder.with_policy_number(policy),
            None => builder,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = AnalysisId::new(id);
        self
    }

    pub fn with_policy_number(mut self, policy_number: impl Into<String>) -> Self {
        self.policy_number = Some(policy_number.into());
        self
    }

    pub fn with_claim_reference(mut self, reference: impl Into<String>) -> Self {
        self.claim_reference = Some(reference.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_combined_score(mut self, score: f64) -> Self {
        self.combined_score = Some(score);
        self
    }

    pub fn with_ml_probability(mut self, probability: f64) -> Self {
        self.ml_probability = Some(probability);
        self
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn created_minutes_after_base(self, minutes: i64) -> Self {
        self.created_at(TemporalFixtures::minutes_after_base(minutes))
    }

    /// Marks the analysis as a placeholder after a scoring failure
    pub fn degraded(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.combined_score = None;
        self.ml_probability = None;
        self.risk_level = RiskLevel::Pending;
        self.status = ReviewStatus::PendingManualReview;
        self
    }

    pub fn build(self) -> FraudAnalysis {
        let mut analysis = FraudAnalysis::new(self.id, self.created_at);
        analysis.policy_number = self.policy_number;
        analysis.claim_reference = self.claim_reference;
        analysis.user_email = self.email;
        analysis.user_display_name = self.display_name;
        analysis.scores.combined_score = self.combined_score;
        analysis.scores.ai_fraud_score = self.combined_score;
        analysis.scores.ml_probability = self.ml_probability;
        analysis.risk_level = self.risk_level;
        analysis.status = self.status;
        analysis.error = self.error;
        analysis.analyzed_at = Some(self.created_at);
        analysis
    }
}
