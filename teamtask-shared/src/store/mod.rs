//! Storage traits for users, teams and tasks
//!
//! Services talk to persistence only through these traits. Two backends are
//! provided:
//!
//! - [`postgres::PgStore`]: the production backend on a `PgPool`
//! - [`memory::MemoryStore`]: `HashMap`s behind `RwLock`s, used by tests
//!
//! Both are bundled in a [`Stores`] handle that is built once at startup and
//! shared across requests.

pub mod memory;
pub mod postgres;

use crate::models::task::Task;
use crate::models::team::Team;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key is already taken
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// A record that must exist is missing
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn already_exists(entity: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Identity store: user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; fails with `AlreadyExists` if the email is taken
    async fn create_user(&self, user: User) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Loads the users with the given IDs, skipping unknown ones
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

/// Team directory: teams, codes and membership
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Inserts a team; fails with `AlreadyExists` if the code is taken
    async fn create_team(&self, team: Team) -> StoreResult<Team>;

    async fn find_team_by_code(&self, code: &str) -> StoreResult<Option<Team>>;

    async fn find_team_by_manager(&self, manager_id: Uuid) -> StoreResult<Option<Team>>;

    async fn set_team_manager(&self, team_id: Uuid, manager_id: Uuid) -> StoreResult<()>;

    /// Adds a member; repeating the call is a no-op
    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Members of a team in join order
    async fn team_members(&self, team_id: Uuid) -> StoreResult<Vec<User>>;
}

/// Task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Writes status, links and lifecycle timestamps; last write wins
    async fn save_task_progress(&self, task: &Task) -> StoreResult<Task>;

    /// Tasks assigned to a member, newest first
    async fn tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Tasks assigned by a manager, newest first
    async fn tasks_assigned_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Completed tasks of the given assignees
    async fn completed_tasks_for(&self, user_ids: &[Uuid]) -> StoreResult<Vec<Task>>;

    async fn count_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<u64>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Shared handle to every store
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub teams: Arc<dyn TeamStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Stores {
    /// All stores backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            users: store.clone(),
            teams: store.clone(),
            tasks: store,
        }
    }

    /// All stores backed by process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            users: store.clone(),
            teams: store.clone(),
            tasks: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
