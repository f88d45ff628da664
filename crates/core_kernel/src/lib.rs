//! Core Kernel - Foundational types shared by the review workspace
//!
//! This crate provides the building blocks used across all other crates:
//! - Opaque, strongly-typed identifiers for store documents
//! - Port error type and adapter marker traits
//! - The explicit session context carried into every user action

pub mod identifiers;
pub mod ports;
pub mod session;
pub mod error;

pub use identifiers::{ClaimId, AnalysisId, UserId};
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
pub use session::SessionContext;
pub use error::CoreError;
