//! Common view of claims and analyses for the review machinery

use chrono::{DateTime, Utc};

use crate::analysis::FraudAnalysis;
use crate::claim::Claim;
use crate::review::ReviewUpdate;
use crate::status::{Collection, RecordRef, ReviewStatus};

/// A document that carries review fields
pub trait ReviewRecord: Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id_str(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn status(&self) -> ReviewStatus;
    fn email(&self) -> Option<&str>;
    fn display_name(&self) -> Option<&str>;
    fn policy_number(&self) -> Option<&str>;

    /// Fields searched by the dashboard's free-text box
    fn search_keys(&self) -> Vec<&str>;

    /// Copies the review fields of `update` onto the record
    fn apply_review(&mut self, update: &ReviewUpdate);

    fn record_ref(&self) -> RecordRef {
        RecordRef::new(Self::COLLECTION, self.id_str())
    }
}

impl ReviewRecord for Claim {
    const COLLECTION: Collection = Collection::Claims;

    fn id_str(&self) -> &str {
        self.id.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn email(&self) -> Option<&str> {
        self.claimant.email.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.claimant.display_name.as_deref()
    }

    fn policy_number(&self) -> Option<&str> {
        self.policy_number.as_deref()
    }

    fn search_keys(&self) -> Vec<&str> {
        [
            self.email(),
            self.display_name(),
            self.policy_number(),
            Some(self.id.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_review(&mut self, update: &ReviewUpdate) {
        self.status = update.status;
        self.updated_at = update.updated_at;
        self.reviewed_at = Some(update.reviewed_at);
        self.reviewed_by = Some(update.reviewed_by.clone());
        if let Some(notes) = &update.review_notes {
            self.review_notes = Some(notes.clone());
        }
    }
}

impl ReviewRecord for FraudAnalysis {
    const COLLECTION: Collection = Collection::Analyses;

    fn id_str(&self) -> &str {
        self.analysis_id.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.user_display_name.as_deref()
    }

    fn policy_number(&self) -> Option<&str> {
        self.policy_number.as_deref()
    }

    fn search_keys(&self) -> Vec<&str> {
        [
            self.email(),
            self.display_name(),
            self.policy_number(),
            Some(self.analysis_id.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_review(&mut self, update: &ReviewUpdate) {
        self.status = update.status;
        self.updated_at = update.updated_at;
        self.reviewed_at = Some(update.reviewed_at);
        self.reviewed_by = Some(update.reviewed_by.clone());
        if let Some(notes) = &update.review_notes {
            self.review_notes = Some(notes.clone());
        }
    }
}
