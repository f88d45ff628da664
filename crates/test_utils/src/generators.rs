//! Property-Based Test Generators
//!
//! Proptest strategies for score cards, statuses and small collections of
//! claims and analyses with deliberately colliding keys.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use core_kernel::{AnalysisId, ClaimId};
use domain_claims::analysis::{FraudAnalysis, ScoreCard, ScoreScale};
use domain_claims::claim::Claim;
use domain_claims::status::ReviewStatus;

/// Strategy for a raw score field: absent, NaN, fraction, percent, or out of range
pub fn raw_score_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        (0.0f64..=1.0).prop_map(Some),
        (1.0f64..=100.0).prop_map(Some),
        (-100.0f64..500.0).prop_map(Some),
    ]
}

/// Strategy for score cards as they appear in stored documents
pub fn score_card_strategy() -> impl Strategy<Value = ScoreCard> {
    (
        raw_score_strategy(),
        raw_score_strategy(),
        raw_score_strategy(),
        raw_score_strategy(),
        raw_score_strategy(),
        raw_score_strategy(),
    )
        .prop_map(|(rule, prob, conf, ai, ai_conf, combined)| ScoreCard {
            rule_based_score: rule,
            ml_probability: prob,
            ml_confidence: conf,
            ml_prediction: None,
            ai_fraud_score: ai,
            ai_confidence: ai_conf,
            combined_score: combined,
            scale: ScoreScale::Native,
        })
}

pub fn review_status_strategy() -> impl Strategy<Value = ReviewStatus> {
    prop_oneof![
        Just(ReviewStatus::UnderReview),
        Just(ReviewStatus::Approved),
        Just(ReviewStatus::Rejected),
        Just(ReviewStatus::PendingManualReview),
    ]
}

/// Strategy for policy numbers drawn from a small pool so collisions happen
pub fn policy_number_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        (0u8..4).prop_map(|n| Some(format!("P-{}", n))),
    ]
}

/// Strategy for claim ids sharing a handful of six-character prefixes
pub fn claim_id_strategy() -> impl Strategy<Value = String> {
    (0u8..3, 0u16..1000).prop_map(|(prefix, suffix)| format!("cl{:04}{:03}", prefix, suffix))
}

pub fn claim_strategy() -> impl Strategy<Value = Claim> {
    (claim_id_strategy(), policy_number_strategy(), 0i64..10_000, review_status_strategy()).prop_map(
        |(id, policy, minutes, status)| {
            let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
            let mut claim = Claim::new(ClaimId::new(id), policy, created);
            claim.status = status;
            claim
        },
    )
}

pub fn analysis_strategy() -> impl Strategy<Value = FraudAnalysis> {
    (
        prop_oneof![
            claim_id_strategy().prop_map(|id| format!("FA-{}-x", &id[..6])),
            "[A-Z]{2}[0-9]{3}",
        ],
        policy_number_strategy(),
        policy_number_strategy(),
        0i64..10_000,
        score_card_strategy(),
        review_status_strategy(),
    )
        .prop_map(|(id, policy, reference, minutes, scores, status)| {
            let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
            let mut analysis = FraudAnalysis::new(AnalysisId::new(id), created);
            analysis.policy_number = policy;
            analysis.claim_reference = reference;
            analysis.scores = scores;
            analysis.status = status;
            analysis
        })
}

/// Strategy for an analysis collection of up to `max` records
pub fn analyses_strategy(max: usize) -> impl Strategy<Value = Vec<FraudAnalysis>> {
    prop::collection::vec(analysis_strategy(), 0..=max)
}

pub fn claims_strategy(max: usize) -> impl Strategy<Value = Vec<Claim>> {
    prop::collection::vec(claim_strategy(), 0..=max)
}
