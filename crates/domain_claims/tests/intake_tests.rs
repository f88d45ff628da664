//! Claim intake tests: scored submissions, degraded placeholders, timeouts and
//! session checks

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use domain_claims::adapters::{InMemoryDocumentStore, PrecomputedScoring};
use domain_claims::analysis::AiAction;
use domain_claims::intake::{ClaimIntakeService, ClaimSubmission, DEGRADED_EXPLANATION};
use domain_claims::ports::{DocumentStore, ListQuery};
use domain_claims::reconcile::{match_analysis, MatchStrategy};
use domain_claims::risk::{RiskLevel, RiskTier};
use domain_claims::status::ReviewStatus;
use domain_claims::ClaimError;

use test_utils::{assert_approx_eq, AmountFixtures, PipelineFixtures, SessionFixtures};

fn submission(policy: Option<&str>) -> ClaimSubmission {
    ClaimSubmission {
        policy_number: policy.map(str::to_string),
        amounts: AmountFixtures::collision(),
        description: Some("Side swiped while parked".to_string()),
        ..ClaimSubmission::default()
    }
}

fn service(store: &Arc<InMemoryDocumentStore>, pipeline: PrecomputedScoring) -> ClaimIntakeService {
    ClaimIntakeService::new(store.clone(), Arc::new(pipeline))
}

#[tokio::test]
async fn test_scored_submission_persists_claim_and_analysis() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::scored(PipelineFixtures::medium_risk()));

    let outcome = intake
        .submit(&SessionFixtures::claimant(), submission(Some("P-900")))
        .await
        .unwrap();

    assert!(!outcome.degraded);
    assert_eq!(outcome.claim.status, ReviewStatus::UnderReview);
    assert_eq!(outcome.claim.claimant.email.as_deref(), Some("driver@example.com"));
    assert_eq!(outcome.analysis.status, ReviewStatus::UnderReview);
    assert_eq!(outcome.analysis.risk_level, RiskLevel::Medium);
    assert_eq!(outcome.analysis.tier(), RiskTier::Medium);
    assert_approx_eq(outcome.analysis.combined_percent(), 55.4, 1e-9);

    let claims = store.list_claims(ListQuery::default()).await.unwrap();
    let analyses = store.list_analyses(ListQuery::default()).await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(analyses.len(), 1);

    let m = match_analysis(&claims[0], &analyses).unwrap();
    assert_eq!(m.strategy, MatchStrategy::PolicyNumber);
}

#[tokio::test]
async fn test_submission_without_policy_reconciles_by_id_prefix() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::scored(PipelineFixtures::high_risk()));

    let outcome = intake
        .submit(&SessionFixtures::claimant(), submission(None))
        .await
        .unwrap();

    let analyses = [outcome.analysis.clone()];
    let m = match_analysis(&outcome.claim, &analyses).unwrap();
    assert_eq!(m.strategy, MatchStrategy::AnalysisIdPrefix);
    assert_eq!(outcome.analysis.tier(), RiskTier::High);
}

#[tokio::test]
async fn test_pipeline_failure_writes_degraded_records() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::failed("model server unreachable"));

    let outcome = intake
        .submit(&SessionFixtures::claimant(), submission(Some("P-901")))
        .await
        .unwrap();

    assert!(outcome.degraded);
    assert_eq!(outcome.claim.status, ReviewStatus::PendingManualReview);

    let analysis = &outcome.analysis;
    assert_eq!(analysis.status, ReviewStatus::PendingManualReview);
    assert_eq!(analysis.risk_level, RiskLevel::Pending);
    assert_eq!(analysis.ai.action, AiAction::EscalateInvestigation);
    assert_eq!(analysis.ai.explanation.as_deref(), Some(DEGRADED_EXPLANATION));
    assert!(analysis.error.as_deref().is_some_and(|e| e.contains("unreachable")));
    assert!(analysis.is_degraded());

    let stored = store.get_analysis(&analysis.analysis_id).await.unwrap();
    assert_eq!(stored.status, ReviewStatus::PendingManualReview);
    let stored_claim = store.get_claim(&outcome.claim.id).await.unwrap();
    assert_eq!(stored_claim.status, ReviewStatus::PendingManualReview);
}

#[tokio::test]
async fn test_missing_verdict_degrades() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::from_option(None));

    let outcome = intake
        .submit(&SessionFixtures::claimant(), submission(Some("P-902")))
        .await
        .unwrap();
    assert!(outcome.degraded);
}

#[tokio::test]
async fn test_slow_pipeline_times_out_to_degraded() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let pipeline = PrecomputedScoring::scored(PipelineFixtures::medium_risk())
        .with_delay(Duration::from_secs(5));
    let intake = service(&store, pipeline).with_timeout(Duration::from_millis(20));

    let outcome = intake
        .submit(&SessionFixtures::claimant(), submission(Some("P-903")))
        .await
        .unwrap();

    assert!(outcome.degraded);
    assert!(outcome
        .analysis
        .error
        .as_deref()
        .is_some_and(|e| e.contains("timed out")));
}

#[tokio::test]
async fn test_unresolved_session_is_rejected_before_any_write() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::scored(PipelineFixtures::medium_risk()));

    let err = intake
        .submit(&SessionFixtures::unresolved(), submission(Some("P-904")))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaimError::Unauthenticated(_)));
    assert!(store.list_claims(ListQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_amount_is_a_validation_error() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let intake = service(&store, PrecomputedScoring::scored(PipelineFixtures::medium_risk()));

    let mut bad = submission(Some("P-905"));
    bad.amounts.injury = dec!(-1.00);

    let err = intake.submit(&SessionFixtures::claimant(), bad).await.unwrap_err();
    assert!(matches!(err, ClaimError::Validation(_)));
    assert!(store.list_analyses(ListQuery::default()).await.unwrap().is_empty());
}
