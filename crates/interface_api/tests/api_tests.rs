//! HTTP API tests over the in-memory store

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::SessionContext;
use domain_claims::adapters::InMemoryDocumentStore;
use domain_claims::{Claim, FraudAnalysis, ReviewStatus};
use interface_api::auth::{create_token, permissions};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

use test_utils::{AnalysisBuilder, ClaimBuilder, PipelineFixtures, SessionFixtures};

struct Harness {
    server: TestServer,
    store: Arc<InMemoryDocumentStore>,
    config: ApiConfig,
}

impl Harness {
    async fn new(claims: Vec<Claim>, analyses: Vec<FraudAnalysis>) -> Self {
        let store = Arc::new(InMemoryDocumentStore::with_records(claims, analyses).await);
        let config = ApiConfig::default();
        let state = AppState::new(store.clone(), config.clone()).await.unwrap();
        let server = TestServer::new(create_router(state)).unwrap();
        Self { server, store, config }
    }

    async fn empty() -> Self {
        Self::new(vec![], vec![]).await
    }

    fn bearer(&self, session: &SessionContext, roles: &[&str]) -> HeaderValue {
        let roles = roles.iter().map(|r| r.to_string()).collect();
        let token = create_token(session, roles, &self.config.jwt_secret, 3600).unwrap();
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    fn reviewer(&self) -> HeaderValue {
        self.bearer(
            &SessionFixtures::reviewer(),
            &[permissions::CLAIM_READ, permissions::CLAIM_REVIEW],
        )
    }

    fn claimant(&self) -> HeaderValue {
        self.bearer(&SessionFixtures::claimant(), &[permissions::CLAIM_SUBMIT])
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let harness = Harness::empty().await;
        let response = harness.server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_with_live_feed() {
        let harness = Harness::empty().await;
        let response = harness.server.get("/health/ready").await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["live_feed"], true);
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let harness = Harness::empty().await;
        let response = harness.server.get("/api/v1/dashboard").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_token_with_wrong_secret_is_unauthorized() {
        let harness = Harness::empty().await;
        let token = create_token(&SessionFixtures::reviewer(), vec![], "other-secret", 60).unwrap();
        let response = harness
            .server
            .get("/api/v1/dashboard")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reader_cannot_review() {
        let analysis = AnalysisBuilder::new().with_id("FA-read-0001").build();
        let harness = Harness::new(vec![], vec![analysis]).await;
        let reader = harness.bearer(&SessionFixtures::reviewer(), &[permissions::CLAIM_READ]);

        let response = harness
            .server
            .post("/api/v1/analyses/FA-read-0001/approve")
            .add_header(header::AUTHORIZATION, reader)
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(harness.store.update_calls(), 0);
    }
}

mod intake_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_with_verdict_is_scored_and_reconciled() {
        let harness = Harness::empty().await;
        let verdict = serde_json::to_value(PipelineFixtures::medium_risk()).unwrap();

        let response = harness
            .server
            .post("/api/v1/claims")
            .add_header(header::AUTHORIZATION, harness.claimant())
            .json(&json!({
                "policy_number": "POL-7781",
                "amounts": { "total": "24500.00", "injury": "6500.00", "property": "3000.00", "vehicle": "15000.00" },
                "description": "Rear-ended at a traffic light",
                "pipeline_result": verdict,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["degraded"], false);
        assert_eq!(body["combined_score"], 55.4);
        assert_eq!(body["tier"], "medium");
        assert_eq!(body["claim"]["status"], "Under Review");
        assert_eq!(body["claim"]["claimant"]["email"], "driver@example.com");

        let claim_id = body["claim"]["id"].as_str().unwrap().to_string();
        let analysis_id = body["analysis"]["analysis_id"].as_str().unwrap().to_string();

        let detail = harness
            .server
            .get(&format!("/api/v1/claims/{}", claim_id))
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;
        detail.assert_status_ok();
        let detail = detail.json::<Value>();
        assert_eq!(detail["analysis"]["analysis_id"], analysis_id.as_str());
        assert_eq!(detail["analysis"]["strategy"], "policy_number");
    }

    #[tokio::test]
    async fn test_submit_without_verdict_goes_to_manual_review() {
        let harness = Harness::empty().await;

        let response = harness
            .server
            .post("/api/v1/claims")
            .add_header(header::AUTHORIZATION, harness.claimant())
            .json(&json!({ "description": "Hail damage" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["degraded"], true);
        assert_eq!(body["claim"]["status"], "Pending Manual Review");
        assert_eq!(body["analysis"]["status"], "Pending Manual Review");
        assert_eq!(body["analysis"]["risk_level"], "PENDING");
    }

    #[tokio::test]
    async fn test_submit_rejects_negative_amount() {
        let harness = Harness::empty().await;

        let response = harness
            .server
            .post("/api/v1/claims")
            .add_header(header::AUTHORIZATION, harness.claimant())
            .json(&json!({ "amounts": { "total": "-10.00" } }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_reviewer_cannot_submit() {
        let harness = Harness::empty().await;

        let response = harness
            .server
            .post("/api/v1/claims")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }
}

mod review_tests {
    use super::*;

    async fn paired() -> Harness {
        let claim = ClaimBuilder::new()
            .with_id("c7f3a9d2-0001")
            .with_policy_number("POL-100")
            .build();
        let analysis = AnalysisBuilder::for_claim(&claim).with_id("FA-c7f3a9-0001").build();
        Harness::new(vec![claim], vec![analysis]).await
    }

    #[tokio::test]
    async fn test_approve_analysis_with_claim() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/analyses/FA-c7f3a9-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .json(&json!({ "include_claim": true }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["analysis"]["status"], "Approved");
        assert_eq!(body["analysis"]["previous_status"], "Under Review");
        assert_eq!(body["analysis"]["review_notes"], "Approved after review");
        assert_eq!(body["analysis"]["reviewed_by"], "reviewer@insurer.example");
        assert_eq!(body["claim"]["result"], "applied");
        assert_eq!(body["claim"]["id"], "c7f3a9d2-0001");

        let claims = harness
            .server
            .get("/api/v1/claims")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();
        assert_eq!(claims[0]["status"], "Approved");
    }

    #[tokio::test]
    async fn test_reject_requires_notes() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/reject")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .json(&json!({ "notes": "   " }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(harness.store.update_calls(), 0);

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/reject")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .json(&json!({ "notes": "Staged collision" }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["collection"], "claims");
        assert_eq!(body["status"], "Rejected");
        assert_eq!(body["review_notes"], "Staged collision");
    }

    #[tokio::test]
    async fn test_terminal_record_conflicts() {
        let harness = paired().await;

        harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .assert_status_ok();

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/flag")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(harness.store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_body_uses_default_note() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["review_notes"], "Approved after review");
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_rejected() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .text(r#"{"notes":"verified invoice"}"#)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "bad_request");
        assert_eq!(harness.store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_rejected() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/analyses/FA-c7f3a9-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .bytes(Bytes::from_static(b"{\"notes\": \"verified invoice\", \"include_claim\": tru"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(harness.store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_notes_sent_as_json_are_kept() {
        let harness = paired().await;

        let response = harness
            .server
            .post("/api/v1/claims/c7f3a9d2-0001/approve")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .json(&json!({ "notes": "verified invoice" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["review_notes"], "verified invoice");
    }

    #[tokio::test]
    async fn test_unknown_analysis_is_not_found() {
        let harness = Harness::empty().await;

        let response = harness
            .server
            .post("/api/v1/analyses/FA-missing/flag")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_and_rolled_back() {
        let harness = paired().await;
        harness
            .store
            .fail_next_update(core_kernel::PortError::connection("store offline"));

        let response = harness
            .server
            .post("/api/v1/analyses/FA-c7f3a9-0001/flag")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let analysis = harness
            .server
            .get("/api/v1/analyses/FA-c7f3a9-0001")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();
        assert_eq!(analysis["analysis"]["status"], "Under Review");
    }
}

mod dashboard_tests {
    use super::*;

    async fn seeded() -> Harness {
        let analyses = vec![
            AnalysisBuilder::new()
                .with_id("FA-aaa111-0001")
                .with_email("alex@example.com")
                .with_combined_score(82.0)
                .created_minutes_after_base(1)
                .build(),
            AnalysisBuilder::new()
                .with_id("FA-bbb222-0001")
                .with_email("blair@example.com")
                .with_status(ReviewStatus::Approved)
                .created_minutes_after_base(2)
                .build(),
            AnalysisBuilder::new()
                .with_id("FA-ccc333-0001")
                .with_email("casey@example.com")
                .with_status(ReviewStatus::PendingManualReview)
                .created_minutes_after_base(3)
                .build(),
        ];
        Harness::new(vec![], analyses).await
    }

    #[tokio::test]
    async fn test_dashboard_lists_newest_first_with_counts() {
        let harness = seeded().await;

        let view = harness
            .server
            .get("/api/v1/dashboard")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();

        let ids: Vec<&str> = view["analyses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["analysis"]["analysis_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["FA-ccc333-0001", "FA-bbb222-0001", "FA-aaa111-0001"]);
        assert_eq!(view["counts"]["total"], 3);
        assert_eq!(view["counts"]["approved"], 1);
        assert_eq!(view["counts"]["pending_manual_review"], 1);
    }

    #[tokio::test]
    async fn test_dashboard_filter_and_search_apply_per_request() {
        let harness = seeded().await;

        let filtered = harness
            .server
            .get("/api/v1/dashboard")
            .add_query_param("status", "Pending Manual Review")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();
        assert_eq!(filtered["analyses"].as_array().unwrap().len(), 1);
        assert_eq!(filtered["counts"]["total"], 3);

        let searched = harness
            .server
            .get("/api/v1/dashboard")
            .add_query_param("search", "ALEX@")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();
        let rows = searched["analyses"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["tier"], "high");

        // The shared board is unaffected by per-request filters
        let unfiltered = harness
            .server
            .get("/api/v1/dashboard")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await
            .json::<Value>();
        assert_eq!(unfiltered["analyses"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unknown_status() {
        let harness = seeded().await;

        let response = harness
            .server
            .get("/api/v1/dashboard")
            .add_query_param("status", "Escalated")
            .add_header(header::AUTHORIZATION, harness.reviewer())
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
