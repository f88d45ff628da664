//! Request and response bodies

pub mod claims;
pub mod review;
pub mod dashboard;
