//! Review status, status filter, and record references

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClaimError;

/// Review status shared by claims and fraud analyses
///
/// Serialized with the display labels the document store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// Awaiting a reviewer's decision
    #[serde(rename = "Under Review", alias = "UnderReview", alias = "under_review")]
    UnderReview,
    /// Approved by a reviewer
    #[serde(alias = "approved")]
    Approved,
    /// Rejected by a reviewer (notes required)
    #[serde(alias = "rejected")]
    Rejected,
    /// Escalated for manual review
    #[serde(
        rename = "Pending Manual Review",
        alias = "PendingManualReview",
        alias = "pending_manual_review"
    )]
    PendingManualReview,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 4] = [
        ReviewStatus::UnderReview,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
        ReviewStatus::PendingManualReview,
    ];

    /// Display label as stored
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::UnderReview => "Under Review",
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Rejected => "Rejected",
            ReviewStatus::PendingManualReview => "Pending Manual Review",
        }
    }

    /// Whether the dashboard exposes disposition actions for this status
    pub fn is_reviewable(&self) -> bool {
        matches!(self, ReviewStatus::UnderReview | ReviewStatus::PendingManualReview)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Approved | ReviewStatus::Rejected)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ReviewStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "underreview" => Ok(ReviewStatus::UnderReview),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "pendingmanualreview" => Ok(ReviewStatus::PendingManualReview),
            _ => Err(ClaimError::Validation(format!("unknown review status '{}'", s))),
        }
    }
}

/// Status filter of the dashboard; `All` disables filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReviewStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ReviewStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

/// The two logical collections consumed from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Claims,
    #[serde(rename = "fraud_analyses")]
    Analyses,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Claims => "claims",
            Collection::Analyses => "fraud_analyses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one document: the key for guards, overlays and updates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub collection: Collection,
    pub id: String,
}

impl RecordRef {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }

    pub fn claim(id: &core_kernel::ClaimId) -> Self {
        Self::new(Collection::Claims, id.as_str())
    }

    pub fn analysis(id: &core_kernel::AnalysisId) -> Self {
        Self::new(Collection::Analyses, id.as_str())
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
