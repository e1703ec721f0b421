//! # DYHE back-office
//!
//! Authentication and session lifecycle for the DYHE back-office: a
//! credential store, JWT access/refresh issuance and validation, an edge
//! route guard for page requests, and a client-side session guard.
//!
//! ## Architecture
//!
//! ```text
//! Edge guard → REST API (axum) → Auth services → SQLite credential store
//!                    ↓                  ↓
//!             Observability        JWT keys (HS256)
//! ```
//!
//! The `client` module is the consumer side of the same lifecycle: a typed
//! HTTP client, the session guard protected views mount, and a scoped query
//! cache.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod guard;
pub mod observability;
pub mod startup;
pub mod storage;

pub use config::{load_config, AppConfig};
pub use errors::{DyheError, Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "dyhe");
    }
}
