//! Dashboard DTOs

use serde::Deserialize;

use domain_claims::StatusFilter;

use crate::error::ApiError;

/// Query string of the dashboard endpoint
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// Case-insensitive substring over id, policy number, name and email
    pub search: Option<String>,
    /// A status label, or `All`
    pub status: Option<String>,
}

impl DashboardParams {
    pub fn status_filter(&self) -> Result<StatusFilter, ApiError> {
        match self.status.as_deref() {
            Some(raw) => Ok(raw.parse()?),
            None => Ok(StatusFilter::All),
        }
    }

    pub fn search_term(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}
