//! Task model and database operations
//!
//! A task is assigned by a manager to one member of their team and moves
//! forward through a small lifecycle. Completed is terminal.
//!
//! # State Machine
//!
//! ```text
//! pending → in_progress → completed
//! pending ──────────────→ completed   (unless start is required first)
//! in_progress → in_progress           (restart overwrites started_at)
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT,
//!     assigned_to UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     assigned_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     status task_status NOT NULL DEFAULT 'pending',
//!     deliverable_link VARCHAR(2048),
//!     completion_proof VARCHAR(2048),
//!     assigned_at TIMESTAMPTZ NOT NULL,
//!     started_at TIMESTAMPTZ,
//!     submitted_at TIMESTAMPTZ,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use teamtask_shared::models::task::{Task, TaskStatus};
//! use uuid::Uuid;
//!
//! let assigned_at = Utc::now();
//! let mut task = Task::new(
//!     "Write release notes".to_string(),
//!     None,
//!     Uuid::new_v4(),
//!     Uuid::new_v4(),
//!     assigned_at,
//! );
//!
//! task.start(assigned_at + Duration::minutes(1)).unwrap();
//! task.submit(assigned_at + Duration::minutes(31), Some("https://example.com/notes".into()), None)
//!     .unwrap();
//!
//! assert_eq!(task.status, TaskStatus::Completed);
//! assert_eq!(task.timestamps.completion_duration(), Some(Duration::minutes(30)));
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, not yet started
    Pending,

    /// Started by the assignee
    InProgress,

    /// Submitted (terminal)
    Completed,
}

impl TaskStatus {
    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, InProgress) | (Pending, Completed) | (InProgress, Completed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move task from {from} to {to}")]
pub struct InvalidTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Lifecycle timestamps of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskTimestamps {
    /// Set at creation, never changes
    pub assigned_at: DateTime<Utc>,

    /// Set when the assignee starts the task
    pub started_at: Option<DateTime<Utc>>,

    /// Set when the assignee submits the task
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TaskTimestamps {
    /// Time between start and submission, if both happened
    pub fn completion_duration(&self) -> Option<Duration> {
        match (self.started_at, self.submitted_at) {
            (Some(started), Some(submitted)) => Some(submitted - started),
            _ => None,
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Longer description
    pub description: Option<String>,

    /// Member doing the work
    pub assigned_to: Uuid,

    /// Manager who assigned it
    pub assigned_by: Uuid,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Link to the delivered work
    pub deliverable_link: Option<String>,

    /// URL of the uploaded proof of completion
    pub completion_proof: Option<String>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub timestamps: TaskTimestamps,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a pending task assigned at `now`
    pub fn new(
        title: String,
        description: Option<String>,
        assigned_to: Uuid,
        assigned_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            assigned_to,
            assigned_by,
            status: TaskStatus::Pending,
            deliverable_link: None,
            completion_proof: None,
            timestamps: TaskTimestamps {
                assigned_at: now,
                started_at: None,
                submitted_at: None,
            },
            updated_at: now,
        }
    }

    /// Checks that the task may move to `next`
    pub fn ensure_transition(&self, next: TaskStatus) -> Result<(), InvalidTransition> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    /// Marks the task in progress; restarting overwrites `started_at`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.ensure_transition(TaskStatus::InProgress)?;

        self.status = TaskStatus::InProgress;
        self.timestamps.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the task completed with the given deliverable and proof
    ///
    /// A missing proof clears any earlier `completion_proof`.
    pub fn submit(
        &mut self,
        now: DateTime<Utc>,
        deliverable_link: Option<String>,
        completion_proof: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.ensure_transition(TaskStatus::Completed)?;

        self.status = TaskStatus::Completed;
        self.deliverable_link = deliverable_link;
        self.completion_proof = completion_proof;
        self.timestamps.submitted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Inserts a task row
    pub async fn insert(pool: &PgPool, task: &Task) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, title, description, assigned_to, assigned_by, status,
                               deliverable_link, completion_proof, assigned_at, started_at,
                               submitted_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assigned_to)
        .bind(task.assigned_by)
        .bind(task.status)
        .bind(&task.deliverable_link)
        .bind(&task.completion_proof)
        .bind(task.timestamps.assigned_at)
        .bind(task.timestamps.started_at)
        .bind(task.timestamps.submitted_at)
        .bind(task.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persists the mutable lifecycle fields of `task`
    ///
    /// Returns `None` if the row no longer exists.
    pub async fn save_progress(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2,
                deliverable_link = $3,
                completion_proof = $4,
                started_at = $5,
                submitted_at = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(task.status)
        .bind(&task.deliverable_link)
        .bind(&task.completion_proof)
        .bind(task.timestamps.started_at)
        .bind(task.timestamps.submitted_at)
        .bind(task.updated_at)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks assigned to a member, newest first
    pub async fn list_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE assigned_to = $1 ORDER BY assigned_at DESC, id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists tasks assigned by a manager, newest first
    pub async fn list_by_assigner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE assigned_by = $1 ORDER BY assigned_at DESC, id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists completed tasks whose assignee is in `user_ids`
    pub async fn completed_for(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE assigned_to = ANY($1) AND status = 'completed'
            ORDER BY assigned_at DESC, id ASC
            "#,
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await
    }

    /// Counts every task assigned to a member regardless of status
    pub async fn count_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE assigned_to = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }
}
