//! Business logic
//!
//! - [`lifecycle`]: assigning, starting and submitting tasks
//! - [`analytics`]: completion statistics for managers and members
//! - [`account`]: registration, login and team directory
//!
//! Services depend only on the store traits, a [`Clock`](crate::clock::Clock)
//! and a [`ProofUploader`](crate::upload::ProofUploader), so they run the
//! same against PostgreSQL and the in-memory store.

pub mod account;
pub mod analytics;
pub mod lifecycle;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::models::task::{InvalidTransition, TaskStatus};
use crate::store::StoreError;
use crate::upload::UploadError;
use thiserror::Error;

pub use account::{AccountService, AuthSession, LoginInput, RegisterInput};
pub use analytics::{AnalyticsService, MemberAnalytics, MemberSummary};
pub use lifecycle::{AssignTaskInput, AssignedTask, LifecyclePolicy, SubmitTaskInput, TaskLifecycleService};

/// Errors returned by services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Caller's role does not allow the operation
    #[error("{0}")]
    Forbidden(String),

    /// Task is missing or belongs to someone else; the two are not distinguished
    #[error("Task not found or unauthorized")]
    TaskNotFoundOrUnauthorized,

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot move task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::InsufficientRole { .. } => ServiceError::Forbidden(err.to_string()),
            AuthzError::NotOwner => ServiceError::TaskNotFoundOrUnauthorized,
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists { entity, .. } => {
                ServiceError::Conflict(format!("{entity} already exists"))
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Result type for services
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: ServiceError = StoreError::already_exists("User", "a@b.c").into();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg == "User already exists"));

        let err: ServiceError = StoreError::not_found("Task", "x").into();
        assert!(matches!(err, ServiceError::Store(_)));
    }

    #[test]
    fn test_authz_errors_map_to_forbidden_and_not_found() {
        let err: ServiceError = AuthzError::NotOwner.into();
        assert!(matches!(err, ServiceError::TaskNotFoundOrUnauthorized));

        let err: ServiceError = AuthzError::InsufficientRole {
            required: Role::Manager,
            actual: Role::Member,
        }
        .into();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn test_transition_error_message() {
        let err: ServiceError = InvalidTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::InProgress,
        }
        .into();
        assert_eq!(err.to_string(), "Cannot move task from completed to in_progress");
    }
}
