//! User model and database operations
//!
//! A user is either the manager of a team or one of its members. The role is
//! fixed at registration and drives which API routes the user may call.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE user_role AS ENUM ('manager', 'member');
//!
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     email CITEXT NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     role user_role NOT NULL,
//!     team_id UUID NOT NULL REFERENCES teams(id),
//!     team_code VARCHAR(16) NOT NULL,
//!     profile_photo VARCHAR(1024),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Role of a user within their team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates the team and assigns tasks
    #[serde(alias = "Project Manager", alias = "Manager")]
    Manager,

    /// Joins a team by code and works on assigned tasks
    #[serde(alias = "Team Member", alias = "Member")]
    Member,
}

impl Role {
    /// Converts role to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
///
/// The password hash never leaves the server; use [`PublicUser`] for responses.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, case-insensitive)
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// Manager or member
    pub role: Role,

    /// Team this user belongs to
    pub team_id: Uuid,

    /// Code of that team, denormalized for directory lookups
    pub team_code: String,

    /// URL of the uploaded profile photo
    pub profile_photo: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub team_id: Uuid,
    pub team_code: String,
    pub profile_photo: Option<String>,
}

impl CreateUser {
    /// Materializes the row this input describes, with a fresh ID
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            team_id: self.team_id,
            team_code: self.team_code,
            profile_photo: self.profile_photo,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_code: String,
    pub profile_photo: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            team_code: user.team_code.clone(),
            profile_photo: user.profile_photo.clone(),
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            team_code: user.team_code,
            profile_photo: user.profile_photo,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email::TEXT AS email, password_hash, role, team_id, team_code, \
                            profile_photo, created_at, updated_at";

impl User {
    /// Inserts a user row
    ///
    /// # Errors
    ///
    /// Returns a database error with a unique violation if the email is taken.
    pub async fn insert(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, team_id, team_code,
                               profile_photo, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.team_id)
            .bind(&user.team_code)
            .bind(&user.profile_photo)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Loads every user whose ID is in `ids`; unknown IDs are skipped
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");

        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        CreateUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: Role::Member,
            team_id: Uuid::new_v4(),
            team_code: "A1B2C3".to_string(),
            profile_photo: None,
        }
        .into_user(Utc::now())
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Manager.as_str(), "manager");
        assert_eq!(Role::Member.as_str(), "member");
        assert_eq!(Role::Member.to_string(), "member");
    }

    #[test]
    fn test_role_accepts_legacy_labels() {
        let manager: Role = serde_json::from_str("\"Project Manager\"").unwrap();
        let member: Role = serde_json::from_str("\"Team Member\"").unwrap();
        let plain: Role = serde_json::from_str("\"member\"").unwrap();

        assert_eq!(manager, Role::Manager);
        assert_eq!(member, Role::Member);
        assert_eq!(plain, Role::Member);
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
    }

    #[test]
    fn test_public_user_omits_password_hash() {
        let user = sample_user();
        let public = PublicUser::from(&user);
        let json = serde_json::to_value(&public).unwrap();

        assert_eq!(json["name"], "Ada");
        assert_eq!(json["team_code"], "A1B2C3");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_into_user_sets_timestamps() {
        let user = sample_user();
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.role, Role::Member);
    }
}
