//! # TeamTask Shared Library
//!
//! This crate contains the domain types, persistence and business logic used
//! by the TeamTask API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `services`: Task lifecycle, analytics and account services
//! - `upload`: Object store client for proofs and profile photos
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migrations
//! - `clock`: Injectable time source

pub mod auth;
pub mod clock;
pub mod db;
pub mod models;
pub mod services;
pub mod store;
pub mod upload;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
