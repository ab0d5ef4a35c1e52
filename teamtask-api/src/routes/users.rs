//! User directory endpoints

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use teamtask_shared::{auth::middleware::AuthContext, models::user::PublicUser};

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

/// `GET /users/profile`
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.accounts.profile(auth.user_id).await?;
    Ok(Json(ProfileResponse { user }))
}

/// `GET /users/team` (manager): members in join order
pub async fn team_members(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<PublicUser>>> {
    Ok(Json(state.accounts.team_members(auth.user_id).await?))
}
