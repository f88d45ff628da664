//! Review Desk Ports
//!
//! Port interfaces for the two external collaborators of the review core: the
//! persistent document store holding claims and analyses, and the fraud
//! scoring pipeline.
//!
//! # Architecture
//!
//! Services receive the ports as trait objects and never see an adapter type:
//!
//! - **In-memory adapter** (`adapters::memory`): tests and local runs
//! - **PostgreSQL adapter** (`infra_db`): JSONB documents with a
//!   LISTEN/NOTIFY change feed
//!
//! ```rust,ignore
//! let store: Arc<dyn DocumentStore> = match config.database_url {
//!     Some(url) => Arc::new(PostgresDocumentStore::connect(&url).await?),
//!     None => Arc::new(InMemoryDocumentStore::new()),
//! };
//! let reviews = ReviewService::new(store.clone());
//! ```
//!
//! # Change feeds
//!
//! `subscribe_*` returns a [`Subscription`]: the first delivery is a
//! [`ChangeBatch::Snapshot`] of the whole collection, followed by
//! [`ChangeBatch::Changes`] in the order the store committed them. Dropping the
//! subscription (or calling [`Subscription::unsubscribe`]) detaches it.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use core_kernel::{AnalysisId, ClaimId, DomainPort, HealthCheckable, PortError};

use crate::analysis::FraudAnalysis;
use crate::claim::Claim;
use crate::intake::{ClaimSubmission, PipelineResult};
use crate::review::ReviewUpdate;
use crate::status::{Collection, RecordRef, ReviewStatus};

/// A single document change
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange<T> {
    /// Added or modified; carries the whole document
    Upsert(T),
    /// Deleted; carries the document id
    Removed(String),
}

/// One delivery of a change feed
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeBatch<T> {
    /// Replaces the whole collection
    Snapshot(Vec<T>),
    Changes(Vec<DocumentChange<T>>),
}

impl<T> ChangeBatch<T> {
    pub fn len(&self) -> usize {
        match self {
            ChangeBatch::Snapshot(docs) => docs.len(),
            ChangeBatch::Changes(changes) => changes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live subscription to a collection's change feed
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<ChangeBatch<T>>,
    pump: Option<AbortHandle>,
}

impl<T> Subscription<T> {
    /// Wraps a receiver fed directly by the store
    pub fn new(receiver: mpsc::UnboundedReceiver<ChangeBatch<T>>) -> Self {
        Self {
            receiver,
            pump: None,
        }
    }

    /// Wraps a receiver fed by a background task, which is aborted on drop
    pub fn with_pump(receiver: mpsc::UnboundedReceiver<ChangeBatch<T>>, pump: AbortHandle) -> Self {
        Self {
            receiver,
            pump: Some(pump),
        }
    }

    /// Next delivery, or `None` once the feed has ended
    pub async fn next(&mut self) -> Option<ChangeBatch<T>> {
        self.receiver.recv().await
    }

    /// Stops the feed; no further deliveries are observed
    pub fn unsubscribe(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.receiver.close();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Query parameters for listing documents
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Filter by review status
    pub status: Option<ReviewStatus>,
    /// Filter by policy number
    pub policy_number: Option<String>,
    /// Filter by submitter email
    pub email: Option<String>,
    /// Limit results
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn by_status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn with_policy_number(mut self, policy_number: impl Into<String>) -> Self {
        self.policy_number = Some(policy_number.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document with these fields passes the equality filters
    pub fn accepts(&self, status: ReviewStatus, policy_number: Option<&str>, email: Option<&str>) -> bool {
        self.status.map_or(true, |wanted| wanted == status)
            && self.policy_number.as_deref().map_or(true, |p| policy_number == Some(p))
            && self.email.as_deref().map_or(true, |e| email == Some(e))
    }
}

/// Persistent store of claims and analyses
///
/// The store owns both collections. Updates only ever touch review fields.
/// All list operations return documents newest-first by `created_at`.
#[async_trait]
pub trait DocumentStore: DomainPort + HealthCheckable {
    /// Persists a new claim
    ///
    /// # Returns
    ///
    /// `PortError::Conflict` if a claim with the same id exists
    async fn create_claim(&self, claim: &Claim) -> Result<(), PortError>;

    /// Persists a new analysis
    async fn create_analysis(&self, analysis: &FraudAnalysis) -> Result<(), PortError>;

    /// Retrieves a claim by id, or `PortError::NotFound`
    async fn get_claim(&self, id: &ClaimId) -> Result<Claim, PortError>;

    /// Retrieves an analysis by id, or `PortError::NotFound`
    async fn get_analysis(&self, id: &AnalysisId) -> Result<FraudAnalysis, PortError>;

    async fn list_claims(&self, query: ListQuery) -> Result<Vec<Claim>, PortError>;

    async fn list_analyses(&self, query: ListQuery) -> Result<Vec<FraudAnalysis>, PortError>;

    /// Writes the review fields of one document
    ///
    /// # Arguments
    ///
    /// * `record` - Collection and id of the document
    /// * `update` - Fields to write; `review_notes: None` leaves notes as stored
    ///
    /// # Returns
    ///
    /// `PortError::NotFound` if the document does not exist
    async fn update_review(&self, record: &RecordRef, update: &ReviewUpdate) -> Result<(), PortError>;

    /// Subscribes to the claims change feed
    async fn subscribe_claims(&self) -> Result<Subscription<Claim>, PortError>;

    /// Subscribes to the analyses change feed
    async fn subscribe_analyses(&self) -> Result<Subscription<FraudAnalysis>, PortError>;
}

/// Convenience methods over any [`DocumentStore`]
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Current review status of a document
    async fn current_status(&self, record: &RecordRef) -> Result<ReviewStatus, PortError> {
        match record.collection {
            Collection::Claims => Ok(self.get_claim(&ClaimId::new(record.id.as_str())).await?.status),
            Collection::Analyses => Ok(self
                .get_analysis(&AnalysisId::new(record.id.as_str()))
                .await?
                .status),
        }
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

/// The external fraud scoring pipeline
#[async_trait]
pub trait ScoringPipeline: Send + Sync {
    /// Scores a claim submission
    ///
    /// The call may be slow or fail; callers bound it with a timeout and fall
    /// back to a degraded analysis.
    async fn score(&self, submission: &ClaimSubmission) -> Result<PipelineResult, PortError>;
}
