//! Review state machine
//!
//! ```text
//! Under Review ──┬─> Approved
//!                ├─> Rejected
//!                └─> Pending Manual Review ──┬─> Approved
//!                                            ├─> Rejected
//!                                            └─> Pending Manual Review
//! ```
//!
//! A transition is planned into a [`ReviewUpdate`], the exact field set that is
//! applied locally and written to the store. Planning is pure; applying it to
//! a record is a plain field copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::SessionContext;
use crate::error::ClaimError;
use crate::record::ReviewRecord;
use crate::status::ReviewStatus;

pub const DEFAULT_APPROVAL_NOTE: &str = "Approved after review";
pub const DEFAULT_FLAG_NOTE: &str = "Flagged for manual review";

/// Disposition action a reviewer can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
    #[serde(alias = "flag")]
    FlagForReview,
}

impl ReviewAction {
    pub fn target_status(&self) -> ReviewStatus {
        match self {
            ReviewAction::Approve => ReviewStatus::Approved,
            ReviewAction::Reject => ReviewStatus::Rejected,
            ReviewAction::FlagForReview => ReviewStatus::PendingManualReview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::FlagForReview => "flag",
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewAction {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(ReviewAction::Approve),
            "reject" => Ok(ReviewAction::Reject),
            "flag" | "flag_for_review" => Ok(ReviewAction::FlagForReview),
            other => Err(ClaimError::validation(format!("unknown review action '{}'", other))),
        }
    }
}

/// A reviewer's decision, built at the moment the action is taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    pub action: ReviewAction,
    /// Trimmed notes; blank input is `None`
    pub notes: Option<String>,
    pub actor: String,
    pub decided_at: DateTime<Utc>,
}

impl ReviewDecision {
    pub fn new(
        action: ReviewAction,
        notes: Option<&str>,
        session: &SessionContext,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            notes: notes.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
            actor: session.actor_label(),
            decided_at,
        }
    }

    pub fn target_status(&self) -> ReviewStatus {
        self.action.target_status()
    }

    /// Checks the decision before anything is written
    ///
    /// # Errors
    ///
    /// `ClaimError::Validation` when a rejection has no notes or the actor is
    /// blank.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.actor.trim().is_empty() {
            return Err(ClaimError::validation("reviewer identity is required"));
        }
        if self.action == ReviewAction::Reject && self.notes.is_none() {
            return Err(ClaimError::validation(
                "Please provide a reason for rejection",
            ));
        }
        Ok(())
    }

    /// Notes to persist, falling back to the per-action default
    pub fn effective_notes(&self) -> Option<String> {
        match (&self.notes, self.action) {
            (Some(notes), _) => Some(notes.clone()),
            (None, ReviewAction::Approve) => Some(DEFAULT_APPROVAL_NOTE.to_string()),
            (None, ReviewAction::FlagForReview) => Some(DEFAULT_FLAG_NOTE.to_string()),
            (None, ReviewAction::Reject) => None,
        }
    }
}

/// Field set written by a status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub status: ReviewStatus,
    /// `None` leaves existing notes untouched
    pub review_notes: Option<String>,
    pub reviewed_by: String,
    pub reviewed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal-state handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    /// Refuse transitions out of Approved and Rejected
    pub enforce_terminal_states: bool,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            enforce_terminal_states: true,
        }
    }
}

impl ReviewPolicy {
    /// Terminality is only a matter of which buttons the dashboard shows
    pub fn ui_only() -> Self {
        Self {
            enforce_terminal_states: false,
        }
    }

    pub fn can_transition(&self, from: ReviewStatus, to: ReviewStatus) -> bool {
        if to == ReviewStatus::UnderReview {
            return false;
        }
        !(self.enforce_terminal_states && from.is_terminal())
    }
}

/// Plans the update a decision makes to a record in status `current`
///
/// The decision is expected to have passed [`ReviewDecision::validate`].
///
/// # Errors
///
/// `ClaimError::InvalidStatusTransition` when the policy refuses the move.
pub fn plan_transition(
    current: ReviewStatus,
    decision: &ReviewDecision,
    policy: ReviewPolicy,
) -> Result<ReviewUpdate, ClaimError> {
    let target = decision.target_status();
    if !policy.can_transition(current, target) {
        return Err(ClaimError::InvalidStatusTransition {
            from: current,
            to: target,
        });
    }

    Ok(ReviewUpdate {
        status: target,
        review_notes: decision.effective_notes(),
        reviewed_by: decision.actor.clone(),
        reviewed_at: decision.decided_at,
        updated_at: decision.decided_at,
    })
}

/// Plans and applies a decision to a copy of `record`
pub fn apply_transition<R: ReviewRecord>(
    record: &R,
    decision: &ReviewDecision,
    policy: ReviewPolicy,
) -> Result<(R, ReviewUpdate), ClaimError> {
    let update = plan_transition(record.status(), decision, policy)?;
    let mut next = record.clone();
    next.apply_review(&update);
    Ok((next, update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> SessionContext {
        SessionContext::new("u-1").with_email("reviewer@example.com")
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_reject_requires_notes() {
        let blank = ReviewDecision::new(ReviewAction::Reject, Some("   "), &session(), at());
        assert!(matches!(blank.validate(), Err(ClaimError::Validation(_))));

        let ok = ReviewDecision::new(ReviewAction::Reject, Some("staged accident"), &session(), at());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_default_notes() {
        let approve = ReviewDecision::new(ReviewAction::Approve, None, &session(), at());
        assert_eq!(approve.effective_notes().as_deref(), Some(DEFAULT_APPROVAL_NOTE));

        let flag = ReviewDecision::new(ReviewAction::FlagForReview, Some(""), &session(), at());
        assert_eq!(flag.effective_notes().as_deref(), Some(DEFAULT_FLAG_NOTE));
    }

    #[test]
    fn test_plan_sets_all_review_fields() {
        let decision = ReviewDecision::new(ReviewAction::Approve, None, &session(), at());
        let update = plan_transition(ReviewStatus::UnderReview, &decision, ReviewPolicy::default()).unwrap();
        assert_eq!(update.status, ReviewStatus::Approved);
        assert_eq!(update.reviewed_by, "reviewer@example.com");
        assert_eq!(update.reviewed_at, at());
        assert_eq!(update.updated_at, at());
    }

    #[test]
    fn test_reflagging_is_allowed() {
        let decision = ReviewDecision::new(ReviewAction::FlagForReview, None, &session(), at());
        assert!(plan_transition(ReviewStatus::PendingManualReview, &decision, ReviewPolicy::default()).is_ok());
    }

    #[test]
    fn test_terminal_states_enforced_by_default() {
        let decision = ReviewDecision::new(ReviewAction::FlagForReview, None, &session(), at());
        let err = plan_transition(ReviewStatus::Approved, &decision, ReviewPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ClaimError::InvalidStatusTransition { from: ReviewStatus::Approved, to: ReviewStatus::PendingManualReview }
        ));
    }

    #[test]
    fn test_ui_only_policy_allows_leaving_terminal_states() {
        let decision = ReviewDecision::new(ReviewAction::Approve, None, &session(), at());
        assert!(plan_transition(ReviewStatus::Rejected, &decision, ReviewPolicy::ui_only()).is_ok());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("flag".parse::<ReviewAction>().unwrap(), ReviewAction::FlagForReview);
        assert_eq!("APPROVE".parse::<ReviewAction>().unwrap(), ReviewAction::Approve);
        assert!("escalate".parse::<ReviewAction>().is_err());
    }
}
