//! In-flight action guard
//!
//! At most one status change per record may be in flight. A second request
//! for the same record is refused immediately rather than queued. The key is
//! held by an [`InFlightPermit`] and released when the permit is dropped,
//! whichever way the holder exits.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::ClaimError;
use crate::status::RecordRef;

/// Set of records with a status change in flight
#[derive(Debug, Clone, Default)]
pub struct ActionGuard {
    in_flight: Arc<Mutex<HashSet<RecordRef>>>,
}

impl ActionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, HashSet<RecordRef>> {
        // The set stays consistent even if a holder panicked mid-insert
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims `record` for the caller
    ///
    /// # Errors
    ///
    /// `ClaimError::AlreadyProcessing` if another permit for the record is alive.
    pub fn try_acquire(&self, record: &RecordRef) -> Result<InFlightPermit, ClaimError> {
        if !self.keys().insert(record.clone()) {
            debug!(record = %record, "Rejected concurrent status change");
            return Err(ClaimError::AlreadyProcessing(record.clone()));
        }
        Ok(InFlightPermit {
            record: record.clone(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, record: &RecordRef) -> bool {
        self.keys().contains(record)
    }

    pub fn in_flight_count(&self) -> usize {
        self.keys().len()
    }
}

/// Proof that the holder owns the in-flight slot of one record
#[derive(Debug)]
#[must_use = "the record is released as soon as the permit is dropped"]
pub struct InFlightPermit {
    record: RecordRef,
    in_flight: Arc<Mutex<HashSet<RecordRef>>>,
}

impl InFlightPermit {
    pub fn record(&self) -> &RecordRef {
        &self.record
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        let mut keys = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.remove(&self.record);
        debug!(record = %self.record, "Released in-flight permit");
    }
}
