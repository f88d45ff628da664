//! Review service
//!
//! Orchestrates one disposition action end to end:
//!
//! ```text
//! validate -> guard -> current status -> plan -> optimistic overlay
//!          -> store write -> confirm | rollback -> release guard
//! ```
//!
//! The store write runs on its own task which owns the in-flight permit, so a
//! caller that goes away mid-request neither cancels the write nor leaves the
//! record locked.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::{PortError, SessionContext};

use crate::error::ClaimError;
use crate::guard::{ActionGuard, InFlightPermit};
use crate::live::SharedBoard;
use crate::ports::{DocumentStore, DocumentStoreExt, ListQuery};
use crate::reconcile::reconcile_all;
use crate::review::{plan_transition, ReviewAction, ReviewDecision, ReviewPolicy, ReviewUpdate};
use crate::status::{RecordRef, ReviewStatus};

/// Result of an applied disposition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub record: RecordRef,
    pub previous: ReviewStatus,
    pub update: ReviewUpdate,
}

/// Applies reviewer decisions to claims and analyses
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn DocumentStore>,
    guard: ActionGuard,
    board: Option<SharedBoard>,
    policy: ReviewPolicy,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            guard: ActionGuard::new(),
            board: None,
            policy: ReviewPolicy::default(),
        }
    }

    /// Shows decisions on `board` before the store confirms them
    pub fn with_board(mut self, board: SharedBoard) -> Self {
        self.board = Some(board);
        self
    }

    pub fn with_policy(mut self, policy: ReviewPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_guard(mut self, guard: ActionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &ActionGuard {
        &self.guard
    }

    pub fn policy(&self) -> ReviewPolicy {
        self.policy
    }

    /// Applies one disposition action to one record
    ///
    /// # Arguments
    ///
    /// * `session` - The acting reviewer; must be resolved
    /// * `record` - Target claim or analysis
    /// * `action` - Approve, reject or flag
    /// * `notes` - Optional notes; required for a rejection
    ///
    /// # Returns
    ///
    /// The applied update. On a store failure the optimistic update is rolled
    /// back and `ClaimError::Persistence` is returned.
    pub async fn apply_transition(
        &self,
        session: &SessionContext,
        record: &RecordRef,
        action: ReviewAction,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, ClaimError> {
        session.ensure_resolved()?;
        let decision = ReviewDecision::new(action, notes, session, Utc::now());
        decision.validate()?;

        let permit = self.guard.try_acquire(record)?;

        let previous = self.current_status(record).await?;
        let update = plan_transition(previous, &decision, self.policy)?;

        if let Some(board) = &self.board {
            let (record, update) = (record.clone(), update.clone());
            board.update(move |b| b.apply_optimistic(&record, update)).await;
        }

        let write = tokio::spawn(persist(
            Arc::clone(&self.store),
            self.board.clone(),
            permit,
            update.clone(),
        ));
        write
            .await
            .map_err(|e| ClaimError::Internal(format!("review write task failed: {}", e)))??;

        info!(
            record = %record,
            from = %previous,
            to = %update.status,
            reviewed_by = %update.reviewed_by,
            "Review status changed"
        );

        Ok(ReviewOutcome {
            record: record.clone(),
            previous,
            update,
        })
    }

    pub async fn approve(
        &self,
        session: &SessionContext,
        record: &RecordRef,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, ClaimError> {
        self.apply_transition(session, record, ReviewAction::Approve, notes).await
    }

    pub async fn reject(
        &self,
        session: &SessionContext,
        record: &RecordRef,
        notes: &str,
    ) -> Result<ReviewOutcome, ClaimError> {
        self.apply_transition(session, record, ReviewAction::Reject, Some(notes)).await
    }

    pub async fn flag_for_review(
        &self,
        session: &SessionContext,
        record: &RecordRef,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome, ClaimError> {
        self.apply_transition(session, record, ReviewAction::FlagForReview, notes)
            .await
    }

    /// Applies the same decision to an analysis and to its reconciled claim
    ///
    /// The two writes are independent: each is guarded on its own, and a
    /// failure of the claim write does not undo the analysis write. When no
    /// claim reconciles with the analysis only the analysis is changed.
    pub async fn review_pair(
        &self,
        session: &SessionContext,
        analysis: &RecordRef,
        action: ReviewAction,
        notes: Option<&str>,
    ) -> Result<(ReviewOutcome, Option<Result<ReviewOutcome, ClaimError>>), ClaimError> {
        let analysis_outcome = self.apply_transition(session, analysis, action, notes).await?;

        let claim = self.reconciled_claim(analysis).await?;
        let claim_outcome = match claim {
            Some(claim) => Some(self.apply_transition(session, &claim, action, notes).await),
            None => None,
        };

        Ok((analysis_outcome, claim_outcome))
    }

    /// The claim whose own reconciliation over every analysis lands on `analysis`
    ///
    /// A claim that matches this analysis but reconciles with another one is
    /// left alone.
    async fn reconciled_claim(&self, analysis: &RecordRef) -> Result<Option<RecordRef>, ClaimError> {
        let claims = self.store.list_claims(ListQuery::default()).await?;
        let analyses = self.store.list_analyses(ListQuery::default()).await?;
        Ok(reconcile_all(&claims, &analyses)
            .into_iter()
            .find(|(_, matched)| {
                matches!(matched, Some(m) if m.analysis.analysis_id.as_str() == analysis.id)
            })
            .map(|(claim, _)| RecordRef::claim(&claim.id)))
    }

    async fn current_status(&self, record: &RecordRef) -> Result<ReviewStatus, ClaimError> {
        if let Some(board) = &self.board {
            if let Some(status) = board.read().await.current_status(record) {
                return Ok(status);
            }
        }
        self.store.current_status(record).await.map_err(|e| match e {
            PortError::NotFound { .. } => ClaimError::not_found(record),
            other => ClaimError::Persistence(other),
        })
    }
}

/// Writes one update, then confirms or rolls back the overlay
///
/// Holds the permit until the outcome is visible on the board.
async fn persist(
    store: Arc<dyn DocumentStore>,
    board: Option<SharedBoard>,
    permit: InFlightPermit,
    update: ReviewUpdate,
) -> Result<(), ClaimError> {
    let record = permit.record().clone();
    let result = store.update_review(&record, &update).await;

    if let Some(board) = &board {
        match &result {
            Ok(()) => board.update(|b| b.confirm(&record)).await,
            Err(_) => board.update(|b| b.rollback(&record)).await,
        }
    }

    drop(permit);

    result.map_err(|e| {
        warn!(record = %record, error = %e, "Review write failed, rolled back");
        match e {
            PortError::NotFound { .. } => ClaimError::not_found(&record),
            other => ClaimError::Persistence(other),
        }
    })
}
