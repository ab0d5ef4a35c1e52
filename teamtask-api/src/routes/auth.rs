//! Authentication endpoints
//!
//! - `POST /auth/register`: create an account, returns 201 `{token, user}`
//! - `POST /auth/login`: returns `{token, user}`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use teamtask_shared::{
    models::user::Role,
    services::{AuthSession, LoginInput, RegisterInput},
};
use validator::Validate;

/// Register request
///
/// `role` accepts `manager`/`member` as well as `Project Manager`/`Team Member`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Role,

    /// Required when registering as a member
    #[serde(default, alias = "teamCode")]
    #[validate(length(max = 16, message = "Team code is too long"))]
    pub team_code: Option<String>,

    /// Base64 data URI
    #[serde(default, alias = "profilePhotoBase64", alias = "profile_photo_base64")]
    pub profile_photo: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registers a manager (creating a team) or a member (joining one)
///
/// # Errors
///
/// - `400`: unknown or missing team code
/// - `409`: email already registered
/// - `422`: field validation failed
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let Json(req) = payload?;
    req.validate()?;

    let session = state
        .accounts
        .register(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
            team_code: req.team_code,
            profile_photo: req.profile_photo,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Exchanges credentials for a token
///
/// # Errors
///
/// - `401`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthSession>> {
    let Json(req) = payload?;
    req.validate()?;

    let session = state
        .accounts
        .login(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(session))
}
