//! Adapters for the review desk ports
//!
//! # Available Adapters
//!
//! - **InMemoryDocumentStore**: `DocumentStore` over in-process collections
//!   with change feeds, plus failure injection for tests
//! - **PrecomputedScoring**: `ScoringPipeline` answering with a verdict that
//!   was computed before the submission reached this service
//!
//! The PostgreSQL `DocumentStore` lives in `infra_db`.

pub mod memory;
pub mod precomputed;

pub use memory::{InMemoryDocumentStore, UpdateGate};
pub use precomputed::PrecomputedScoring;
