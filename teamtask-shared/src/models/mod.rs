//! Database models for TeamTask
//!
//! Each model owns its SQL. The [`crate::store`] traits wrap these calls so the
//! services never touch a `PgPool` directly.
//!
//! # Models
//!
//! - `user`: Accounts, roles and the public projection returned by the API
//! - `team`: Team codes, their manager and member roster
//! - `task`: Assigned work items and their lifecycle timestamps

pub mod task;
pub mod team;
pub mod user;
