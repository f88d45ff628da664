//! Test Utilities Crate
//!
//! Shared test infrastructure for the review desk workspace.
//!
//! # Modules
//!
//! - `fixtures`: sessions, timestamps, amounts and pipeline verdicts
//! - `builders`: claim and analysis builders with fake contact details
//! - `database`: PostgreSQL testcontainer with the document store schema
//! - `assertions`: ordering and range assertions for review records
//! - `generators`: proptest strategies for scores and record collections

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
