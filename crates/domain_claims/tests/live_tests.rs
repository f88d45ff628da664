//! Live board tests: change-feed subscription, ordering, filtering and
//! detachment

use std::sync::Arc;
use std::time::Duration;

use core_kernel::AnalysisId;
use domain_claims::adapters::InMemoryDocumentStore;
use domain_claims::live::{LiveBoard, SharedBoard};
use domain_claims::ports::{ChangeBatch, DocumentChange, DocumentStore};
use domain_claims::projection::{LiveCollection, ReviewBoard};
use domain_claims::services::ReviewService;
use domain_claims::status::{Collection, RecordRef, ReviewStatus, StatusFilter};

use test_utils::{assert_newest_first, AnalysisBuilder, ClaimBuilder, SessionFixtures};

const WAIT: Duration = Duration::from_secs(2);

/// Waits until `check` holds on the board or the deadline passes
async fn eventually<F>(board: &SharedBoard, check: F)
where
    F: Fn(&ReviewBoard) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let mut revisions = board.subscribe_revisions();
            if check(&*board.read().await) {
                return;
            }
            let _ = revisions.changed().await;
        }
    })
    .await
    .expect("board never reached the expected state");
}

fn analysis_ids(board: &ReviewBoard) -> Vec<String> {
    board
        .view()
        .analyses
        .iter()
        .map(|row| row.analysis.analysis_id.to_string())
        .collect()
}

// ============================================================================
// Subscription
// ============================================================================

mod subscription_tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_delivers_snapshot_then_changes() {
        let claim = ClaimBuilder::new().with_id("c-1").with_policy_number("P-1").build();
        let analysis = AnalysisBuilder::for_claim(&claim).with_id("A-1").build();
        let store = Arc::new(InMemoryDocumentStore::with_records(vec![claim], vec![analysis]).await);
        let board = SharedBoard::default();

        let live = LiveBoard::attach(store.clone(), board.clone()).await.unwrap();
        assert!(live.is_attached());

        eventually(&board, |b| b.view().analyses.len() == 1 && b.view().claims.len() == 1).await;
        {
            let b = board.read().await;
            let row = &b.view().claims[0];
            assert_eq!(row.analysis.as_ref().unwrap().analysis_id, "A-1");
        }

        let newer = AnalysisBuilder::new()
            .with_id("A-2")
            .created_minutes_after_base(10)
            .build();
        store.create_analysis(&newer).await.unwrap();

        eventually(&board, |b| b.view().analyses.len() == 2).await;
        assert_eq!(analysis_ids(&*board.read().await), vec!["A-2", "A-1"]);
    }

    #[tokio::test]
    async fn test_removed_analysis_unmatches_claim() {
        let claim = ClaimBuilder::new().with_id("c-100").with_policy_number("P-100").build();
        let analysis = AnalysisBuilder::new().with_id("A-100").with_policy_number("P-100").build();
        let store = Arc::new(InMemoryDocumentStore::with_records(vec![claim], vec![analysis]).await);
        let board = SharedBoard::default();
        let _live = LiveBoard::attach(store.clone(), board.clone()).await.unwrap();

        eventually(&board, |b| {
            b.view().claims.first().is_some_and(|row| row.analysis.is_some())
        })
        .await;

        assert!(store.remove(&RecordRef::analysis(&AnalysisId::new("A-100"))).await);
        eventually(&board, |b| {
            b.view().claims.first().is_some_and(|row| row.analysis.is_none())
        })
        .await;
    }

    #[tokio::test]
    async fn test_review_reaches_board_through_feed() {
        let analysis = AnalysisBuilder::new().with_id("A-7").build();
        let store = Arc::new(InMemoryDocumentStore::with_records(vec![], vec![analysis]).await);
        let board = SharedBoard::default();
        let _live = LiveBoard::attach(store.clone(), board.clone()).await.unwrap();
        eventually(&board, |b| b.view().analyses.len() == 1).await;

        let service = ReviewService::new(store.clone()).with_board(board.clone());
        service
            .approve(
                &SessionFixtures::reviewer(),
                &RecordRef::analysis(&AnalysisId::new("A-7")),
                None,
            )
            .await
            .unwrap();

        eventually(&board, |b| b.view().counts.approved == 1).await;
        let b = board.read().await;
        assert_eq!(b.view().counts.under_review, 0);
        assert!(!b.view().analyses[0].actionable);
        assert!(!b.view().analyses[0].pending);
    }
}

// ============================================================================
// Ordering
// ============================================================================

mod ordering_tests {
    use super::*;

    #[test]
    fn test_out_of_order_deliveries_last_writer_wins() {
        let mut collection = LiveCollection::new();
        let older = AnalysisBuilder::new().with_id("X").with_status(ReviewStatus::UnderReview).build();
        let mut newer = older.clone();
        newer.status = ReviewStatus::Rejected;
        newer.review_notes = Some("duplicate claim".to_string());

        collection.apply(ChangeBatch::Snapshot(vec![older.clone()]));
        collection.apply(ChangeBatch::Changes(vec![
            DocumentChange::Upsert(newer.clone()),
            DocumentChange::Upsert(older),
            DocumentChange::Upsert(newer),
        ]));

        let stored = collection.get("X").unwrap();
        assert_eq!(stored.status, ReviewStatus::Rejected);
        assert_eq!(stored.review_notes.as_deref(), Some("duplicate claim"));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_older_update_delivered_last_wins() {
        let mut collection = LiveCollection::new();
        let mut older = AnalysisBuilder::new()
            .with_id("X")
            .with_status(ReviewStatus::PendingManualReview)
            .build();
        older.review_notes = Some("needs adjuster".to_string());
        let mut newer = older.clone();
        newer.status = ReviewStatus::Approved;
        newer.review_notes = Some("invoice verified".to_string());

        collection.apply(ChangeBatch::Changes(vec![DocumentChange::Upsert(newer)]));
        collection.apply(ChangeBatch::Changes(vec![DocumentChange::Upsert(older)]));

        let stored = collection.get("X").unwrap();
        assert_eq!(stored.status, ReviewStatus::PendingManualReview);
        assert_eq!(stored.review_notes.as_deref(), Some("needs adjuster"));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_collection_stays_newest_first() {
        let mut collection = LiveCollection::new();
        collection.apply(ChangeBatch::Snapshot(vec![
            AnalysisBuilder::new().with_id("m").created_minutes_after_base(5).build(),
            AnalysisBuilder::new().with_id("z").created_minutes_after_base(1).build(),
        ]));
        collection.apply(ChangeBatch::Changes(vec![DocumentChange::Upsert(
            AnalysisBuilder::new().with_id("a").created_minutes_after_base(9).build(),
        )]));
        assert_newest_first(collection.records());
    }
}

// ============================================================================
// Filtering
// ============================================================================

mod filter_tests {
    use super::*;

    fn seeded_board() -> ReviewBoard {
        let mut board = ReviewBoard::new();
        board.apply_analyses(ChangeBatch::Snapshot(vec![
            AnalysisBuilder::new()
                .with_id("approved-1")
                .with_email("alex@example.com")
                .with_status(ReviewStatus::Approved)
                .build(),
            AnalysisBuilder::new()
                .with_id("open-1")
                .with_email("sam@example.com")
                .with_policy_number("POL-555")
                .build(),
            AnalysisBuilder::new()
                .with_id("rejected-1")
                .with_status(ReviewStatus::Rejected)
                .build(),
        ]));
        board
    }

    #[test]
    fn test_status_filter_keeps_counts_over_everything() {
        let mut board = seeded_board();
        board.set_status_filter(StatusFilter::Only(ReviewStatus::Approved));

        assert_eq!(analysis_ids(&board), vec!["approved-1"]);
        assert_eq!(board.view().counts.total, 3);
        assert_eq!(board.view().counts.rejected, 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut board = seeded_board();
        board.set_search("pol-555");
        assert_eq!(analysis_ids(&board), vec!["open-1"]);

        board.set_search("ALEX@");
        assert_eq!(analysis_ids(&board), vec!["approved-1"]);
    }

    #[test]
    fn test_non_matching_search_yields_empty_list() {
        let mut board = seeded_board();
        board.set_search("no-such-claimant");
        assert!(board.view().analyses.is_empty());

        board.set_search("   ");
        assert_eq!(board.view().analyses.len(), 3);
    }
}

// ============================================================================
// Detachment
// ============================================================================

mod detach_tests {
    use super::*;

    async fn wait_for_subscribers(store: &InMemoryDocumentStore, collection: Collection, expected: usize) {
        tokio::time::timeout(WAIT, async {
            while store.subscriber_count(collection).await != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscriber count never settled");
    }

    #[tokio::test]
    async fn test_detach_releases_both_subscriptions() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let live = LiveBoard::attach(store.clone(), SharedBoard::default()).await.unwrap();
        assert_eq!(store.subscriber_count(Collection::Claims).await, 1);
        assert_eq!(store.subscriber_count(Collection::Analyses).await, 1);

        live.detach();

        wait_for_subscribers(&store, Collection::Claims, 0).await;
        wait_for_subscribers(&store, Collection::Analyses, 0).await;
    }

    #[tokio::test]
    async fn test_dropping_board_releases_subscriptions() {
        let store = Arc::new(InMemoryDocumentStore::new());
        {
            let _live = LiveBoard::attach(store.clone(), SharedBoard::default()).await.unwrap();
        }
        wait_for_subscribers(&store, Collection::Analyses, 0).await;
    }

    #[tokio::test]
    async fn test_detached_board_stops_receiving() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let board = SharedBoard::default();
        let live = LiveBoard::attach(store.clone(), board.clone()).await.unwrap();
        eventually(&board, |b| b.revision() >= 2).await;

        live.detach();
        wait_for_subscribers(&store, Collection::Analyses, 0).await;

        store
            .create_analysis(&AnalysisBuilder::new().with_id("late").build())
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert!(board.read().await.analysis("late").is_none());
    }
}
