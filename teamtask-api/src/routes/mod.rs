//! API route handlers

pub mod analytics;
pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
