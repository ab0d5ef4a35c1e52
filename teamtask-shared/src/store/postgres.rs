//! PostgreSQL storage backend

use super::{StoreError, StoreResult, TaskStore, TeamStore, UserStore};
use crate::models::task::Task;
use crate::models::team::Team;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Maps a unique violation to `AlreadyExists`, everything else to `Database`
fn conflict_or(err: sqlx::Error, entity: &'static str, key: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::already_exists(entity, key)
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        User::insert(&self.pool, &user)
            .await
            .map_err(|e| conflict_or(e, "User", &user.email))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_by_ids(&self.pool, ids).await?)
    }
}

#[async_trait]
impl TeamStore for PgStore {
    async fn create_team(&self, team: Team) -> StoreResult<Team> {
        Team::insert(&self.pool, &team)
            .await
            .map_err(|e| conflict_or(e, "Team", &team.code))
    }

    async fn find_team_by_code(&self, code: &str) -> StoreResult<Option<Team>> {
        Ok(Team::find_by_code(&self.pool, code).await?)
    }

    async fn find_team_by_manager(&self, manager_id: Uuid) -> StoreResult<Option<Team>> {
        Ok(Team::find_by_manager(&self.pool, manager_id).await?)
    }

    async fn set_team_manager(&self, team_id: Uuid, manager_id: Uuid) -> StoreResult<()> {
        if Team::set_manager(&self.pool, team_id, manager_id).await? {
            Ok(())
        } else {
            Err(StoreError::not_found("Team", team_id.to_string()))
        }
    }

    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(Team::add_member(&self.pool, team_id, user_id, joined_at).await?)
    }

    async fn team_members(&self, team_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(Team::members(&self.pool, team_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: Task) -> StoreResult<Task> {
        Task::insert(&self.pool, &task)
            .await
            .map_err(|e| conflict_or(e, "Task", &task.id.to_string()))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn save_task_progress(&self, task: &Task) -> StoreResult<Task> {
        Task::save_progress(&self.pool, task)
            .await?
            .ok_or_else(|| StoreError::not_found("Task", task.id.to_string()))
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_assignee(&self.pool, user_id).await?)
    }

    async fn tasks_assigned_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_assigner(&self.pool, user_id).await?)
    }

    async fn completed_tasks_for(&self, user_ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        Ok(Task::completed_for(&self.pool, user_ids).await?)
    }

    async fn count_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<u64> {
        let count = Task::count_by_assignee(&self.pool, user_id).await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
