//! Team model and database operations
//!
//! A team is created when a manager registers. Members join it later by
//! presenting the team code, and are kept in `team_members` in join order.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE teams (
//!     id UUID PRIMARY KEY,
//!     code VARCHAR(16) NOT NULL UNIQUE,
//!     manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE team_members (
//!     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (team_id, user_id)
//! );
//! ```

use crate::models::user::User;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Number of random bytes behind a team code (hex-encoded to twice as many chars)
pub const TEAM_CODE_BYTES: usize = 3;

/// Team record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Shareable join code, e.g. `"9F03A1"`
    pub code: String,

    /// Manager of the team; `None` until the manager's user row exists
    pub manager_id: Option<Uuid>,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Builds a new team with a fresh code and no manager yet
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: generate_team_code(),
            manager_id: None,
            created_at: now,
        }
    }

    /// Inserts a team row
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the code collides with an existing team.
    pub async fn insert(pool: &PgPool, team: &Team) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, code, manager_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, manager_id, created_at
            "#,
        )
        .bind(team.id)
        .bind(&team.code)
        .bind(team.manager_id)
        .bind(team.created_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a team by its join code
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            "SELECT id, code, manager_id, created_at FROM teams WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Finds the team managed by `manager_id`
    pub async fn find_by_manager(
        pool: &PgPool,
        manager_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            "SELECT id, code, manager_id, created_at FROM teams WHERE manager_id = $1",
        )
        .bind(manager_id)
        .fetch_optional(pool)
        .await
    }

    /// Records `manager_id` as the team's manager
    ///
    /// Returns `false` if no team has this ID.
    pub async fn set_manager(
        pool: &PgPool,
        team_id: Uuid,
        manager_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE teams SET manager_id = $2 WHERE id = $1")
            .bind(team_id)
            .bind(manager_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a member to the team; adding the same user twice is a no-op
    pub async fn add_member(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (team_id, user_id) DO NOTHING
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(joined_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Lists the team's members in join order
    pub async fn members(pool: &PgPool, team_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email::TEXT AS email, u.password_hash, u.role, u.team_id,
                   u.team_code, u.profile_photo, u.created_at, u.updated_at
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.joined_at ASC, u.id ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(pool)
        .await
    }
}

/// Generates a six-character uppercase hex team code
pub fn generate_team_code() -> String {
    let mut bytes = [0u8; TEAM_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_team_code_format() {
        let code = generate_team_code();

        assert_eq!(code.len(), TEAM_CODE_BYTES * 2);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_generate_team_code_varies() {
        let codes: std::collections::HashSet<String> =
            (0..32).map(|_| generate_team_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_new_team_has_no_manager() {
        let team = Team::new(Utc::now());
        assert!(team.manager_id.is_none());
        assert_eq!(team.code.len(), 6);
    }
}
