//! Registration, login and the team directory
//!
//! A manager's registration creates a team with a fresh code; a member's
//! registration joins the team named by the code they present. Both return a
//! signed token together with the public view of the new account.

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::require_role;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_password, validate_password_length, verify_password};
use crate::clock::Clock;
use crate::models::team::Team;
use crate::models::user::{CreateUser, PublicUser, Role, User};
use crate::store::{StoreError, Stores};
use crate::upload::{ProofUploader, PROFILE_PHOTO_FOLDER};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Attempts at finding an unused team code before giving up
const TEAM_CODE_ATTEMPTS: usize = 5;

/// Input for registering an account
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Required for members, ignored for managers
    pub team_code: Option<String>,
    /// Base64 data URI of the profile photo
    pub profile_photo: Option<String>,
}

/// Input for logging in
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Account management
#[derive(Clone)]
pub struct AccountService {
    stores: Stores,
    uploader: Arc<dyn ProofUploader>,
    clock: Arc<dyn Clock>,
    tokens: Arc<TokenIssuer>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountService {
    pub fn new(
        stores: Stores,
        uploader: Arc<dyn ProofUploader>,
        clock: Arc<dyn Clock>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            stores,
            uploader,
            clock,
            tokens,
        }
    }

    /// Creates an account and signs the caller in
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<AuthSession> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }
        let email = normalize_email(&input.email);
        if !email.contains('@') {
            return Err(ServiceError::Validation("A valid email is required".to_string()));
        }
        validate_password_length(&input.password).map_err(ServiceError::Validation)?;

        if self.stores.users.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let joined_team = match input.role {
            Role::Manager => None,
            Role::Member => Some(self.resolve_team_code(input.team_code.as_deref()).await?),
        };

        let password_hash = hash_password(&input.password)?;

        let profile_photo = match input.profile_photo.as_deref().map(str::trim) {
            Some(payload) if !payload.is_empty() => {
                Some(self.uploader.upload(payload, PROFILE_PHOTO_FOLDER).await?)
            }
            _ => None,
        };

        let team = match joined_team {
            Some(team) => team,
            None => self.create_team().await?,
        };

        let now = self.clock.now();
        let user = self
            .stores
            .users
            .create_user(
                CreateUser {
                    name,
                    email,
                    password_hash,
                    role: input.role,
                    team_id: team.id,
                    team_code: team.code.clone(),
                    profile_photo,
                }
                .into_user(now),
            )
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => {
                    ServiceError::Conflict("User already exists".to_string())
                }
                other => other.into(),
            })?;

        match user.role {
            Role::Manager => self.stores.teams.set_team_manager(team.id, user.id).await?,
            Role::Member => self.stores.teams.add_team_member(team.id, user.id, now).await?,
        }

        info!(user_id = %user.id, role = %user.role, team_code = %team.code, "User registered");
        self.session(&user)
    }

    /// Checks credentials and issues a token
    pub async fn login(&self, input: LoginInput) -> ServiceResult<AuthSession> {
        let email = normalize_email(&input.email);
        let user = self
            .stores
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.session(&user)
    }

    /// Public view of the caller's account
    pub async fn profile(&self, user_id: Uuid) -> ServiceResult<PublicUser> {
        self.stores
            .users
            .find_user(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(ServiceError::NotFound { entity: "User" })
    }

    /// Members of the caller's team in join order; managers only
    pub async fn team_members(&self, user_id: Uuid) -> ServiceResult<Vec<PublicUser>> {
        let user = self
            .stores
            .users
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "User" })?;
        require_role(user.role, Role::Manager)?;

        let Some(team) = self.stores.teams.find_team_by_manager(user_id).await? else {
            return Ok(Vec::new());
        };

        Ok(self
            .stores
            .teams
            .team_members(team.id)
            .await?
            .into_iter()
            .filter(|u| u.role == Role::Member)
            .map(PublicUser::from)
            .collect())
    }

    async fn resolve_team_code(&self, code: Option<&str>) -> ServiceResult<Team> {
        let code = code
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ServiceError::Validation("Team code is required for team members".to_string())
            })?;

        self.stores
            .teams
            .find_team_by_code(&code)
            .await?
            .ok_or_else(|| ServiceError::Validation("Invalid team code".to_string()))
    }

    async fn create_team(&self) -> ServiceResult<Team> {
        for _ in 0..TEAM_CODE_ATTEMPTS {
            match self.stores.teams.create_team(Team::new(self.clock.now())).await {
                Ok(team) => return Ok(team),
                Err(StoreError::AlreadyExists { key, .. }) => {
                    warn!(team_code = %key, "Team code collision, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ServiceError::Conflict(
            "Could not allocate a unique team code".to_string(),
        ))
    }

    fn session(&self, user: &User) -> ServiceResult<AuthSession> {
        Ok(AuthSession {
            token: self.tokens.issue(user.id, user.role)?,
            user: PublicUser::from(user),
        })
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}
