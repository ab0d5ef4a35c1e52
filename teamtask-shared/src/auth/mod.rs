//! Authentication and authorization utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing
//! - [`jwt`]: JWT issuance and validation
//! - [`middleware`]: Axum bearer-token and role middleware
//! - [`authorization`]: Role and task ownership checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
