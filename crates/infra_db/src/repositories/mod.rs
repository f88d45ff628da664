//! Repository implementations
//!
//! SQL access for the document store tables. The port adapter in
//! `crate::adapters` builds on these.

pub mod documents;

pub use documents::{DocumentRepository, ReviewEventRow};
