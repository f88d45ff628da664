//! PostgreSQL document store tests
//!
//! Run against a disposable container; ignored by default because they need
//! Docker. Run with `cargo test -p infra_db -- --ignored`.

use std::time::Duration;

use core_kernel::{AnalysisId, ClaimId, PortError};
use domain_claims::ports::{ChangeBatch, DocumentChange, DocumentStore, ListQuery};
use domain_claims::review::ReviewUpdate;
use domain_claims::status::{RecordRef, ReviewStatus};

use test_utils::{
    assert_newest_first, create_isolated_test_database, AnalysisBuilder, ClaimBuilder,
    TemporalFixtures,
};

fn approval(minutes: i64) -> ReviewUpdate {
    let at = TemporalFixtures::minutes_after_base(minutes);
    ReviewUpdate {
        status: ReviewStatus::Approved,
        review_notes: None,
        reviewed_by: "reviewer@insurer.example".to_string(),
        reviewed_at: at,
        updated_at: at,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_get_and_list_newest_first() {
    let db = create_isolated_test_database().await.unwrap();
    let store = db.document_store();

    for (id, minutes) in [("c-1", 0), ("c-2", 30), ("c-3", 15)] {
        let claim = ClaimBuilder::new()
            .with_id(id)
            .with_policy_number(format!("P-{}", id))
            .created_minutes_after_base(minutes)
            .build();
        store.create_claim(&claim).await.unwrap();
    }

    let fetched = store.get_claim(&ClaimId::new("c-2")).await.unwrap();
    assert_eq!(fetched.policy_number.as_deref(), Some("P-c-2"));

    let all = store.list_claims(ListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_newest_first(&all);

    let limited = store.list_claims(ListQuery::default().limit(1)).await.unwrap();
    assert_eq!(limited[0].id.as_str(), "c-2");

    let by_policy = store
        .list_claims(ListQuery::default().with_policy_number("P-c-3"))
        .await
        .unwrap();
    assert_eq!(by_policy.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_and_missing_documents() {
    let db = create_isolated_test_database().await.unwrap();
    let store = db.document_store();
    let analysis = AnalysisBuilder::new().with_id("FA-dup").build();

    store.create_analysis(&analysis).await.unwrap();
    let err = store.create_analysis(&analysis).await.unwrap_err();
    assert!(matches!(err, PortError::Conflict { .. }));

    let err = store.get_analysis(&AnalysisId::new("FA-missing")).await.unwrap_err();
    assert!(err.is_not_found());

    let err = store
        .update_review(&RecordRef::analysis(&AnalysisId::new("FA-missing")), &approval(1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_review_merges_fields_and_records_event() {
    let db = create_isolated_test_database().await.unwrap();
    let store = db.document_store();
    let mut analysis = AnalysisBuilder::new().with_id("FA-1").build();
    analysis.review_notes = Some("initial triage".to_string());
    store.create_analysis(&analysis).await.unwrap();

    let record = RecordRef::analysis(&AnalysisId::new("FA-1"));
    store.update_review(&record, &approval(5)).await.unwrap();

    let stored = store.get_analysis(&AnalysisId::new("FA-1")).await.unwrap();
    assert_eq!(stored.status, ReviewStatus::Approved);
    assert_eq!(stored.reviewed_at, Some(TemporalFixtures::minutes_after_base(5)));
    assert_eq!(stored.updated_at, TemporalFixtures::minutes_after_base(5));
    // Notes absent from the update are kept
    assert_eq!(stored.review_notes.as_deref(), Some("initial triage"));
    assert_eq!(stored.scores, analysis.scores);

    assert_eq!(db.review_event_count("fraud_analyses", "FA-1").await.unwrap(), 1);
    let history = store.review_history(&record).await.unwrap();
    assert_eq!(history[0].status, "Approved");

    let approved = store
        .list_analyses(ListQuery::by_status(ReviewStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_subscription_delivers_snapshot_then_changes() {
    let db = create_isolated_test_database().await.unwrap();
    let store = db.document_store();
    store
        .create_analysis(&AnalysisBuilder::new().with_id("FA-a").build())
        .await
        .unwrap();

    let mut feed = store.subscribe_analyses().await.unwrap();
    match feed.next().await.unwrap() {
        ChangeBatch::Snapshot(analyses) => assert_eq!(analyses.len(), 1),
        other => panic!("expected snapshot, got {:?}", other),
    }

    store
        .create_analysis(&AnalysisBuilder::new().with_id("FA-b").build())
        .await
        .unwrap();
    let next = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap()
        .unwrap();
    match next {
        ChangeBatch::Changes(changes) => match &changes[0] {
            DocumentChange::Upsert(a) => assert_eq!(a.analysis_id.as_str(), "FA-b"),
            other => panic!("expected upsert, got {:?}", other),
        },
        other => panic!("expected changes, got {:?}", other),
    }

    // Claims changes are not delivered on the analyses feed
    store.create_claim(&ClaimBuilder::new().build()).await.unwrap();
    store
        .remove(&RecordRef::analysis(&AnalysisId::new("FA-a")))
        .await
        .unwrap();
    let next = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        next,
        ChangeBatch::Changes(vec![DocumentChange::Removed("FA-a".to_string())])
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_subscription_resyncs_after_listener_is_terminated() {
    let db = create_isolated_test_database().await.unwrap();
    let store = db.document_store();
    store
        .create_analysis(&AnalysisBuilder::new().with_id("FA-a").build())
        .await
        .unwrap();

    let mut feed = store.subscribe_analyses().await.unwrap();
    assert!(matches!(feed.next().await.unwrap(), ChangeBatch::Snapshot(_)));

    let terminated: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM (
             SELECT pg_terminate_backend(pid) FROM pg_stat_activity
             WHERE datname = current_database()
               AND pid <> pg_backend_pid()
               AND query ILIKE 'LISTEN%'
         ) AS t",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert!(terminated >= 1);

    // Written while the listener is down; no later write follows
    store
        .create_analysis(&AnalysisBuilder::new().with_id("FA-b").build())
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(10), feed.next())
        .await
        .unwrap()
        .unwrap();
    let mut ids: Vec<String> = match first {
        ChangeBatch::Snapshot(analyses) => analyses
            .into_iter()
            .map(|a| a.analysis_id.as_str().to_string())
            .collect(),
        other => panic!("expected snapshot after reconnect, got {:?}", other),
    };

    // A write that raced the new LISTEN shows up as a change instead
    if !ids.iter().any(|id| id == "FA-b") {
        let next = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .unwrap()
            .unwrap();
        if let ChangeBatch::Changes(changes) = next {
            for change in changes {
                if let DocumentChange::Upsert(a) = change {
                    ids.push(a.analysis_id.as_str().to_string());
                }
            }
        }
    }
    assert!(ids.iter().any(|id| id == "FA-a"));
    assert!(ids.iter().any(|id| id == "FA-b"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_health_check_reports_healthy() {
    use core_kernel::HealthCheckable;

    let db = create_isolated_test_database().await.unwrap();
    let result = db.document_store().health_check().await;
    assert!(result.is_healthy());
}
