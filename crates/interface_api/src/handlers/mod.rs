//! Request handlers

pub mod health;
pub mod dashboard;
pub mod claims;
pub mod analyses;
