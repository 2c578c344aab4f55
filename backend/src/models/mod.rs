//! Database models for the Business Management Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
