//! Live view projection
//!
//! [`ReviewBoard`] holds the latest copy of both collections plus any pending
//! optimistic review updates, and derives the dashboard view from them. Every
//! mutation recomputes the view, so readers never see a view older than the
//! state it was computed from.

use serde::Serialize;
use std::collections::HashMap;

use crate::analysis::FraudAnalysis;
use crate::claim::Claim;
use crate::ports::{ChangeBatch, DocumentChange};
use crate::reconcile::{AnalysisIndex, Match, MatchStrategy};
use crate::record::ReviewRecord;
use crate::review::ReviewUpdate;
use crate::risk::{ColorToken, RiskTier};
use crate::status::{Collection, RecordRef, ReviewStatus, StatusFilter};

/// Local copy of one collection, newest first
#[derive(Debug, Clone)]
pub struct LiveCollection<T> {
    records: Vec<T>,
}

impl<T> Default for LiveCollection<T> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<T: ReviewRecord> LiveCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one delivery; within a batch later changes win
    pub fn apply(&mut self, batch: ChangeBatch<T>) {
        match batch {
            ChangeBatch::Snapshot(records) => self.records = records,
            ChangeBatch::Changes(changes) => {
                for change in changes {
                    match change {
                        DocumentChange::Upsert(record) => {
                            match self.records.iter_mut().find(|r| r.id_str() == record.id_str()) {
                                Some(existing) => *existing = record,
                                None => self.records.push(record),
                            }
                        }
                        DocumentChange::Removed(id) => self.records.retain(|r| r.id_str() != id),
                    }
                }
            }
        }
        self.sort();
    }

    fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_str().cmp(a.id_str()))
        });
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id_str() == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.records.iter_mut().find(|r| r.id_str() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Case-insensitive substring search over a record's search keys
///
/// A blank term matches everything.
pub fn matches_search<R: ReviewRecord>(record: &R, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record
        .search_keys()
        .iter()
        .any(|key| key.to_lowercase().contains(&needle))
}

/// Records passing both the status filter and the search term, order kept
pub fn filter_records<'a, R: ReviewRecord>(
    records: &'a [R],
    filter: StatusFilter,
    term: &str,
) -> Vec<&'a R> {
    records
        .iter()
        .filter(|r| filter.matches(r.status()) && matches_search(*r, term))
        .collect()
}

/// Number of analyses in each review status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending_manual_review: usize,
}

impl StatusCounts {
    fn tally<'a, R: ReviewRecord + 'a>(records: impl IntoIterator<Item = &'a R>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.total += 1;
            match record.status() {
                ReviewStatus::UnderReview => counts.under_review += 1,
                ReviewStatus::Approved => counts.approved += 1,
                ReviewStatus::Rejected => counts.rejected += 1,
                ReviewStatus::PendingManualReview => counts.pending_manual_review += 1,
            }
        }
        counts
    }
}

/// Number of analyses in each priority tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Degraded analyses without a score
    pub unscored: usize,
}

/// Search term and status filter of a dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub status_filter: StatusFilter,
}

/// One analysis row of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub analysis: FraudAnalysis,
    pub combined_score: f64,
    pub tier: RiskTier,
    pub risk_color: ColorToken,
    /// Whether disposition actions are offered
    pub actionable: bool,
    /// An optimistic update is shown that the store has not confirmed yet
    pub pending: bool,
}

/// A claim's reconciled analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedAnalysis {
    pub analysis_id: String,
    pub strategy: MatchStrategy,
    pub combined_score: f64,
    pub tier: RiskTier,
    pub risk_level: String,
    pub status: ReviewStatus,
}

impl From<Match<'_>> for MatchedAnalysis {
    fn from(m: Match<'_>) -> Self {
        Self {
            analysis_id: m.analysis.analysis_id.to_string(),
            strategy: m.strategy,
            combined_score: m.analysis.combined_percent(),
            tier: m.analysis.tier(),
            risk_level: m.analysis.risk_level.label().to_string(),
            status: m.analysis.status,
        }
    }
}

/// One claim row of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimRow {
    pub claim: Claim,
    /// `None` renders as "no analysis available"
    pub analysis: Option<MatchedAnalysis>,
    pub actionable: bool,
    pub pending: bool,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub revision: u64,
    pub counts: StatusCounts,
    pub tiers: TierCounts,
    pub analyses: Vec<AnalysisRow>,
    pub claims: Vec<ClaimRow>,
}

/// Client-side state of the review dashboard
#[derive(Debug, Clone, Default)]
pub struct ReviewBoard {
    claims: LiveCollection<Claim>,
    analyses: LiveCollection<FraudAnalysis>,
    overlays: HashMap<RecordRef, ReviewUpdate>,
    state: ViewState,
    revision: u64,
    view: DashboardView,
}

impl ReviewBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn apply_claims(&mut self, batch: ChangeBatch<Claim>) {
        self.claims.apply(batch);
        self.recompute();
    }

    pub fn apply_analyses(&mut self, batch: ChangeBatch<FraudAnalysis>) {
        self.analyses.apply(batch);
        self.recompute();
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.state.search = term.into();
        self.recompute();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.state.status_filter = filter;
        self.recompute();
    }

    /// Claim as displayed, including any pending overlay
    pub fn claim(&self, id: &str) -> Option<Claim> {
        self.claims.get(id).map(|c| self.overlaid(c))
    }

    /// Analysis as displayed, including any pending overlay
    pub fn analysis(&self, id: &str) -> Option<FraudAnalysis> {
        self.analyses.get(id).map(|a| self.overlaid(a))
    }

    /// Displayed status of a record, if the board holds it
    pub fn current_status(&self, record: &RecordRef) -> Option<ReviewStatus> {
        if let Some(update) = self.overlays.get(record) {
            return Some(update.status);
        }
        match record.collection {
            Collection::Claims => self.claims.get(&record.id).map(|c| c.status),
            Collection::Analyses => self.analyses.get(&record.id).map(|a| a.status),
        }
    }

    pub fn has_pending(&self, record: &RecordRef) -> bool {
        self.overlays.contains_key(record)
    }

    /// Shows `update` immediately, before the store confirms it
    pub fn apply_optimistic(&mut self, record: &RecordRef, update: ReviewUpdate) {
        self.overlays.insert(record.clone(), update);
        self.recompute();
    }

    /// Folds a confirmed update into the base record
    pub fn confirm(&mut self, record: &RecordRef) {
        if let Some(update) = self.overlays.remove(record) {
            match record.collection {
                Collection::Claims => {
                    if let Some(claim) = self.claims.get_mut(&record.id) {
                        claim.apply_review(&update);
                    }
                }
                Collection::Analyses => {
                    if let Some(analysis) = self.analyses.get_mut(&record.id) {
                        analysis.apply_review(&update);
                    }
                }
            }
            self.recompute();
        }
    }

    /// Discards a failed update; the record shows its stored state again
    pub fn rollback(&mut self, record: &RecordRef) {
        if self.overlays.remove(record).is_some() {
            self.recompute();
        }
    }

    /// The current view further narrowed by `filter` and `term`
    ///
    /// The board's own state is untouched and nothing is recomputed; counts
    /// and tiers stay those of the whole board.
    pub fn narrowed_view(&self, filter: StatusFilter, term: &str) -> DashboardView {
        let analyses = self
            .view
            .analyses
            .iter()
            .filter(|row| filter.matches(row.analysis.status) && matches_search(&row.analysis, term))
            .cloned()
            .collect();
        let claims = self
            .view
            .claims
            .iter()
            .filter(|row| filter.matches(row.claim.status) && matches_search(&row.claim, term))
            .cloned()
            .collect();

        DashboardView {
            revision: self.view.revision,
            counts: self.view.counts,
            tiers: self.view.tiers,
            analyses,
            claims,
        }
    }

    fn overlaid<R: ReviewRecord>(&self, record: &R) -> R {
        let mut shown = record.clone();
        if let Some(update) = self.overlays.get(&record.record_ref()) {
            shown.apply_review(update);
        }
        shown
    }

    /// Rebuilds the view and bumps the revision
    pub fn recompute(&mut self) {
        let claims: Vec<Claim> = self.claims.records().iter().map(|c| self.overlaid(c)).collect();
        let analyses: Vec<FraudAnalysis> =
            self.analyses.records().iter().map(|a| self.overlaid(a)).collect();

        let counts = StatusCounts::tally(&analyses);
        let mut tiers = TierCounts::default();
        for analysis in &analyses {
            if analysis.is_degraded() {
                tiers.unscored += 1;
                continue;
            }
            match analysis.tier() {
                RiskTier::High => tiers.high += 1,
                RiskTier::Medium => tiers.medium += 1,
                RiskTier::Low => tiers.low += 1,
            }
        }

        let filter = self.state.status_filter;
        let term = self.state.search.as_str();

        let analysis_rows = filter_records(&analyses, filter, term)
            .into_iter()
            .map(|a| AnalysisRow {
                combined_score: a.combined_percent(),
                tier: a.tier(),
                risk_color: a.risk_level.color(),
                actionable: a.status.is_reviewable(),
                pending: self.overlays.contains_key(&a.record_ref()),
                analysis: a.clone(),
            })
            .collect();

        let index = AnalysisIndex::build(&analyses);
        let claim_rows = filter_records(&claims, filter, term)
            .into_iter()
            .map(|c| ClaimRow {
                analysis: index.lookup(c).map(MatchedAnalysis::from),
                actionable: c.status.is_reviewable(),
                pending: self.overlays.contains_key(&c.record_ref()),
                claim: c.clone(),
            })
            .collect();

        self.revision += 1;
        self.view = DashboardView {
            revision: self.revision,
            counts,
            tiers,
            analyses: analysis_rows,
            claims: claim_rows,
        };
    }
}
