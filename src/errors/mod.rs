//! # Error Handling
//!
//! Crate-wide error type and result alias. Authentication failures that must
//! never leak their cause to callers live in [`crate::auth::models::AuthError`].

pub mod types;

pub use types::{AuthErrorType, DyheError, Result};

/// Short alias used throughout the crate.
pub type Error = DyheError;
