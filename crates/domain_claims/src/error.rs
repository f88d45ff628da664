//! Claims review errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};
use crate::status::{RecordRef, ReviewStatus};

/// Errors that can occur in the review core
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: ReviewStatus, to: ReviewStatus },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Another status change for the same record is still in flight
    #[error("Already processing {0}")]
    AlreadyProcessing(RecordRef),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PortError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    /// Not-found error for a record reference
    pub fn not_found(record: &RecordRef) -> Self {
        match record.collection {
            crate::status::Collection::Claims => ClaimError::ClaimNotFound(record.id.clone()),
            crate::status::Collection::Analyses => ClaimError::AnalysisNotFound(record.id.clone()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::ClaimNotFound(_) | ClaimError::AnalysisNotFound(_))
    }
}

impl From<CoreError> for ClaimError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(msg) => ClaimError::Validation(msg),
            CoreError::Unauthenticated(msg) => ClaimError::Unauthenticated(msg),
            CoreError::NotFound(msg) => ClaimError::ClaimNotFound(msg),
        }
    }
}
