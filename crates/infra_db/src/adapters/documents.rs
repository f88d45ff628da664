//! PostgreSQL Document Store Adapter
//!
//! Implements the review desk's [`DocumentStore`] port over the `documents`
//! table. Claims and analyses are stored whole as JSONB; review updates merge
//! only the review fields and append a row to `review_events` in the same
//! transaction. Change feeds come from [`crate::feed`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::PostgresDocumentStore;
//! use domain_claims::ports::DocumentStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn DocumentStore> =
//!     Arc::new(PostgresDocumentStore::connect("postgres://localhost/review_desk").await?);
//! let pending = store.list_analyses(ListQuery::by_status(ReviewStatus::UnderReview)).await?;
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AnalysisId, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
use domain_claims::analysis::FraudAnalysis;
use domain_claims::claim::Claim;
use domain_claims::ports::{DocumentStore, ListQuery, Subscription};
use domain_claims::record::ReviewRecord;
use domain_claims::review::ReviewUpdate;
use domain_claims::status::{Collection, RecordRef};

use crate::error::DatabaseError;
use crate::feed;
use crate::pool::{create_pool, DatabaseConfig};
use crate::repositories::{DocumentRepository, ReviewEventRow};

const ADAPTER_ID: &str = "postgres-document-store";

/// PostgreSQL-backed implementation of [`DocumentStore`]
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - missing document -> `PortError::NotFound`
/// - duplicate id -> `PortError::Conflict`
/// - pool or connection failures -> transient `Connection` / `ServiceUnavailable`
/// - undecodable bodies -> `PortError::Transformation`
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    repository: DocumentRepository,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DocumentRepository::new(pool),
        }
    }

    /// Connects with default pool settings and applies migrations
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        Self::connect_with(DatabaseConfig::new(url)).await
    }

    pub async fn connect_with(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn repository(&self) -> &DocumentRepository {
        &self.repository
    }

    /// Recorded review decisions for one document, oldest first
    pub async fn review_history(&self, record: &RecordRef) -> Result<Vec<ReviewEventRow>, PortError> {
        Ok(self.repository.review_events(record.collection, &record.id).await?)
    }

    /// Deletes a document; subscribers receive a removal
    pub async fn remove(&self, record: &RecordRef) -> Result<bool, PortError> {
        Ok(self.repository.delete(record.collection, &record.id).await?)
    }

    async fn insert<R: ReviewRecord + Serialize>(&self, record: &R) -> Result<(), PortError> {
        let body = serde_json::to_value(record).map_err(DatabaseError::from)?;
        self.repository
            .insert(R::COLLECTION, record.id_str(), body, record.created_at(), record.created_at())
            .await
            .map_err(|e| match e {
                DatabaseError::DuplicateEntry(_) => PortError::conflict(format!(
                    "{} already exists",
                    record.record_ref()
                )),
                other => other.into(),
            })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        entity: &str,
        id: &str,
    ) -> Result<T, PortError> {
        let body = self
            .repository
            .fetch(collection, id)
            .await?
            .ok_or_else(|| PortError::not_found(entity, id))?;
        Ok(serde_json::from_value(body).map_err(DatabaseError::from)?)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<T>, PortError> {
        let bodies = self.repository.list(collection, query).await?;
        debug!(collection = %collection, count = bodies.len(), "Listed documents");
        bodies
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(|e| PortError::from(DatabaseError::from(e))))
            .collect()
    }
}

impl DomainPort for PostgresDocumentStore {}

#[async_trait]
impl HealthCheckable for PostgresDocumentStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.repository.pool())
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    async fn create_claim(&self, claim: &Claim) -> Result<(), PortError> {
        self.insert(claim).await
    }

    #[instrument(skip(self, analysis), fields(analysis_id = %analysis.analysis_id))]
    async fn create_analysis(&self, analysis: &FraudAnalysis) -> Result<(), PortError> {
        self.insert(analysis).await
    }

    async fn get_claim(&self, id: &ClaimId) -> Result<Claim, PortError> {
        self.get(Collection::Claims, "Claim", id.as_str()).await
    }

    async fn get_analysis(&self, id: &AnalysisId) -> Result<FraudAnalysis, PortError> {
        self.get(Collection::Analyses, "FraudAnalysis", id.as_str()).await
    }

    async fn list_claims(&self, query: ListQuery) -> Result<Vec<Claim>, PortError> {
        self.list(Collection::Claims, &query).await
    }

    async fn list_analyses(&self, query: ListQuery) -> Result<Vec<FraudAnalysis>, PortError> {
        self.list(Collection::Analyses, &query).await
    }

    #[instrument(skip(self, update), fields(record = %record, status = %update.status))]
    async fn update_review(&self, record: &RecordRef, update: &ReviewUpdate) -> Result<(), PortError> {
        self.repository
            .apply_review(record.collection, &record.id, update)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => {
                    let entity = match record.collection {
                        Collection::Claims => "Claim",
                        Collection::Analyses => "FraudAnalysis",
                    };
                    PortError::not_found(entity, &record.id)
                }
                other => other.into(),
            })
    }

    async fn subscribe_claims(&self) -> Result<Subscription<Claim>, PortError> {
        Ok(feed::subscribe(self.repository.clone(), Collection::Claims).await?)
    }

    async fn subscribe_analyses(&self) -> Result<Subscription<FraudAnalysis>, PortError> {
        Ok(feed::subscribe(self.repository.clone(), Collection::Analyses).await?)
    }
}
