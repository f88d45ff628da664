//! Pre-built Test Fixtures
//!
//! Ready-to-use sessions, timestamps and pipeline verdicts. Values are fixed so
//! that tests comparing timestamps or ordering stay deterministic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::SessionContext;
use domain_claims::claim::ClaimAmounts;
use domain_claims::intake::{AiCheck, ClassifierResult, HybridResult, PipelineResult};

/// Fixture for authenticated sessions
pub struct SessionFixtures;

impl SessionFixtures {
    /// A claims reviewer with email and display name
    pub fn reviewer() -> SessionContext {
        SessionContext::new("reviewer-001")
            .with_email("reviewer@insurer.example")
            .with_display_name("Riley Reviewer")
    }

    /// A second reviewer, for concurrency scenarios
    pub fn second_reviewer() -> SessionContext {
        SessionContext::new("reviewer-002").with_email("second@insurer.example")
    }

    /// A policyholder filing a claim
    pub fn claimant() -> SessionContext {
        SessionContext::new("claimant-042")
            .with_email("driver@example.com")
            .with_display_name("Dana Driver")
    }

    /// A session whose identity was never resolved
    pub fn unresolved() -> SessionContext {
        SessionContext::new("")
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Reference instant (Jun 15, 2024 09:00 UTC)
    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
    }

    pub fn minutes_after_base(minutes: i64) -> DateTime<Utc> {
        Self::base_time() + Duration::minutes(minutes)
    }
}

/// Fixture for claim amounts
pub struct AmountFixtures;

impl AmountFixtures {
    /// A typical collision claim with consistent itemization
    pub fn collision() -> ClaimAmounts {
        ClaimAmounts {
            total: dec!(24500.00),
            injury: dec!(6500.00),
            property: dec!(3000.00),
            vehicle: dec!(15000.00),
        }
    }
}

/// Fixture for scoring pipeline verdicts
pub struct PipelineFixtures;

impl PipelineFixtures {
    /// Verdict for a claim the pipeline considers medium risk
    pub fn medium_risk() -> PipelineResult {
        Self::with_score(55.4, "MEDIUM", 0.48)
    }

    /// Verdict for a claim the pipeline considers high risk
    pub fn high_risk() -> PipelineResult {
        Self::with_score(86.0, "HIGH", 0.93)
    }

    pub fn with_score(fraud_score: f64, risk_level: &str, probability: f64) -> PipelineResult {
        PipelineResult {
            hybrid_result: HybridResult {
                fraud_score: Some(fraud_score),
                risk_level: Some(risk_level.to_string()),
                reasons: vec!["incident reported late at night".to_string()],
                rule_based_score: None,
                catboost_result: ClassifierResult {
                    fraud_probability: probability,
                    prediction: Some(if probability >= 0.5 { "y" } else { "n" }.to_string()),
                    confidence: Some(0.87),
                },
            },
            ai_check: AiCheck {
                action: Some("escalate_investigation".to_string()),
                reasoning: Some("damage pattern inconsistent with reported collision".to_string()),
                confidence_score: Some(0.8),
                fraud_score: Some(fraud_score),
                red_flags: vec!["no police report".to_string()],
                recommendation: Some("request repair invoices".to_string()),
                follow_up_questions: vec![],
                explanation: None,
            },
        }
    }
}
