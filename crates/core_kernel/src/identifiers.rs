//! Strongly-typed identifiers for domain entities
//!
//! Records live in an external document store that assigns opaque string keys,
//! so identifiers wrap a `String` rather than a parsed UUID. Newtypes still keep
//! claim ids and analysis ids from being mixed up.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a new random identifier (32 lowercase hex characters)
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Wraps an identifier issued by the store
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the first `n` characters (or the whole id when shorter)
            pub fn prefix(&self, n: usize) -> &str {
                match self.0.char_indices().nth(n) {
                    Some((idx, _)) => &self.0[..idx],
                    None => &self.0,
                }
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ClaimId, "Identifier of a filed claim document");
define_id!(AnalysisId, "Identifier of a fraud-analysis document");
define_id!(UserId, "Opaque identity issued by the authentication provider");
