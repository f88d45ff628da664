//! Session context
//!
//! The current user is passed explicitly into every intake and review call
//! instead of living in ambient global state. The authentication provider is an
//! external collaborator; this type only carries the identity it resolved.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identifiers::UserId;

/// Identity of the user on whose behalf an action is performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl SessionContext {
    /// Creates a session for a resolved user
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Fails unless the identity is resolvable (non-blank uid)
    pub fn ensure_resolved(&self) -> Result<(), CoreError> {
        if self.uid.as_str().trim().is_empty() {
            return Err(CoreError::unauthenticated("no resolved user identity"));
        }
        Ok(())
    }

    /// Label recorded as `reviewed_by`: email, then display name, then uid
    pub fn actor_label(&self) -> String {
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.display_name.as_deref().filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| self.uid.as_str())
            .to_string()
    }
}
