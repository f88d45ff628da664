//! Database adapters for the review desk ports
//!
//! # Available Adapters
//!
//! - **PostgresDocumentStore**: implements `DocumentStore` over JSONB documents
//!   with a LISTEN/NOTIFY change feed

pub mod documents;

pub use documents::PostgresDocumentStore;
