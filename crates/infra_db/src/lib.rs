//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the review desk, using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] holds the SQL,
//! [`adapters`] implements the domain's `DocumentStore` port on top of it, and
//! [`feed`] turns trigger notifications into change batches.
//!
//! # Storage Model
//!
//! Claims and fraud analyses live in one `documents` table keyed by
//! `(collection, id)` with a JSONB body. Status, policy number and email are
//! generated columns for filtered listing. Review decisions are appended to
//! `review_events` in the same transaction as the document update.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, PostgresDocumentStore};
//!
//! let store = PostgresDocumentStore::connect_with(
//!     DatabaseConfig::new("postgres://localhost/review_desk").max_connections(20),
//! )
//! .await?;
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod feed;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::{DocumentRepository, ReviewEventRow};
pub use adapters::PostgresDocumentStore;
