//! In-memory document store
//!
//! Implements [`DocumentStore`] over two vectors with a change feed per
//! collection. Used by tests and by the server when no database is configured.
//! Feed deliveries are sent while the write lock is held, so every subscriber
//! sees changes in commit order and never misses one between its snapshot and
//! its first change batch.
//!
//! Tests can inject failures and hold updates in flight:
//!
//! ```rust,ignore
//! let store = InMemoryDocumentStore::new();
//! store.fail_next_update(PortError::connection("network down"));
//! let gate = store.hold_updates();
//! // ... start a review, observe it in flight ...
//! gate.release(1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, RwLock, Semaphore};

use core_kernel::{
    AdapterHealth, AnalysisId, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};

use crate::analysis::FraudAnalysis;
use crate::claim::Claim;
use crate::ports::{ChangeBatch, DocumentChange, DocumentStore, ListQuery, Subscription};
use crate::record::ReviewRecord;
use crate::review::ReviewUpdate;
use crate::status::{Collection, RecordRef};

type Feed<T> = mpsc::UnboundedSender<ChangeBatch<T>>;

#[derive(Debug)]
struct Shelf<T> {
    records: Vec<T>,
    feeds: Vec<Feed<T>>,
}

impl<T> Default for Shelf<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            feeds: Vec::new(),
        }
    }
}

impl<T: ReviewRecord> Shelf<T> {
    fn publish(&mut self, batch: ChangeBatch<T>) {
        self.feeds.retain(|feed| feed.send(batch.clone()).is_ok());
    }

    fn newest_first(&self) -> Vec<T> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_str().cmp(a.id_str()))
        });
        records
    }

    fn insert(&mut self, record: &T, entity: &str) -> Result<(), PortError> {
        if self.records.iter().any(|r| r.id_str() == record.id_str()) {
            return Err(PortError::conflict(format!(
                "{} {} already exists",
                entity,
                record.id_str()
            )));
        }
        self.records.push(record.clone());
        self.publish(ChangeBatch::Changes(vec![DocumentChange::Upsert(record.clone())]));
        Ok(())
    }

    fn get(&self, id: &str, entity: &str) -> Result<T, PortError> {
        self.records
            .iter()
            .find(|r| r.id_str() == id)
            .cloned()
            .ok_or_else(|| PortError::not_found(entity, id))
    }

    fn list(&self, query: &ListQuery) -> Vec<T> {
        let mut records: Vec<T> = self
            .newest_first()
            .into_iter()
            .filter(|r| query.accepts(r.status(), r.policy_number(), r.email()))
            .collect();
        if let Some(limit) = query.limit {
            records.truncate(limit as usize);
        }
        records
    }

    fn update(&mut self, id: &str, update: &ReviewUpdate, entity: &str) -> Result<(), PortError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id_str() == id)
            .ok_or_else(|| PortError::not_found(entity, id))?;
        record.apply_review(update);
        let changed = record.clone();
        self.publish(ChangeBatch::Changes(vec![DocumentChange::Upsert(changed)]));
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id_str() != id);
        let removed = self.records.len() != before;
        if removed {
            self.publish(ChangeBatch::Changes(vec![DocumentChange::Removed(id.to_string())]));
        }
        removed
    }

    fn subscribe(&mut self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        // A fresh receiver cannot be closed yet
        let _ = tx.send(ChangeBatch::Snapshot(self.newest_first()));
        self.feeds.push(tx);
        Subscription::new(rx)
    }

    fn live_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| !f.is_closed()).count()
    }
}

#[derive(Debug, Default)]
struct Collections {
    claims: Shelf<Claim>,
    analyses: Shelf<FraudAnalysis>,
}

/// Holds review updates until released
#[derive(Debug, Clone)]
pub struct UpdateGate {
    permits: Arc<Semaphore>,
}

impl UpdateGate {
    /// Lets `n` held or future updates proceed
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }
}

/// In-memory implementation of [`DocumentStore`]
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Collections>>,
    failures: Mutex<VecDeque<PortError>>,
    gate: Mutex<Option<UpdateGate>>,
    update_calls: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates both collections
    pub async fn with_records(claims: Vec<Claim>, analyses: Vec<FraudAnalysis>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            inner.claims.records = claims;
            inner.analyses.records = analyses;
        }
        store
    }

    /// Makes the next `update_review` call fail with `error`
    pub fn fail_next_update(&self, error: PortError) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(error);
    }

    /// Holds every subsequent `update_review` until the gate releases it
    pub fn hold_updates(&self) -> UpdateGate {
        let gate = UpdateGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        *self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(gate.clone());
        gate
    }

    /// Number of `update_review` calls received so far, including held ones
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Deletes a document and publishes the removal
    pub async fn remove(&self, record: &RecordRef) -> bool {
        let mut inner = self.inner.write().await;
        match record.collection {
            Collection::Claims => inner.claims.remove(&record.id),
            Collection::Analyses => inner.analyses.remove(&record.id),
        }
    }

    /// Number of open change-feed subscriptions on a collection
    pub async fn subscriber_count(&self, collection: Collection) -> usize {
        let inner = self.inner.read().await;
        match collection {
            Collection::Claims => inner.claims.live_feeds(),
            Collection::Analyses => inner.analyses.live_feeds(),
        }
    }

    async fn wait_at_gate(&self) {
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }
    }

    fn take_failure(&self) -> Option<PortError> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

impl DomainPort for InMemoryDocumentStore {}

#[async_trait]
impl HealthCheckable for InMemoryDocumentStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-document-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: chrono::Utc::now(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_claim(&self, claim: &Claim) -> Result<(), PortError> {
        self.inner.write().await.claims.insert(claim, "Claim")
    }

    async fn create_analysis(&self, analysis: &FraudAnalysis) -> Result<(), PortError> {
        self.inner.write().await.analyses.insert(analysis, "FraudAnalysis")
    }

    async fn get_claim(&self, id: &ClaimId) -> Result<Claim, PortError> {
        self.inner.read().await.claims.get(id.as_str(), "Claim")
    }

    async fn get_analysis(&self, id: &AnalysisId) -> Result<FraudAnalysis, PortError> {
        self.inner.read().await.analyses.get(id.as_str(), "FraudAnalysis")
    }

    async fn list_claims(&self, query: ListQuery) -> Result<Vec<Claim>, PortError> {
        Ok(self.inner.read().await.claims.list(&query))
    }

    async fn list_analyses(&self, query: ListQuery) -> Result<Vec<FraudAnalysis>, PortError> {
        Ok(self.inner.read().await.analyses.list(&query))
    }

    async fn update_review(&self, record: &RecordRef, update: &ReviewUpdate) -> Result<(), PortError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_at_gate().await;
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let mut inner = self.inner.write().await;
        match record.collection {
            Collection::Claims => inner.claims.update(&record.id, update, "Claim"),
            Collection::Analyses => inner.analyses.update(&record.id, update, "FraudAnalysis"),
        }
    }

    async fn subscribe_claims(&self) -> Result<Subscription<Claim>, PortError> {
        Ok(self.inner.write().await.claims.subscribe())
    }

    async fn subscribe_analyses(&self) -> Result<Subscription<FraudAnalysis>, PortError> {
        Ok(self.inner.write().await.analyses.subscribe())
    }
}
