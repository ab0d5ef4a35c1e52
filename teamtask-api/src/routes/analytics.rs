//! Analytics endpoints

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use std::collections::BTreeMap;
use teamtask_shared::{
    auth::middleware::AuthContext,
    services::{MemberAnalytics, MemberSummary},
};
use uuid::Uuid;

/// `GET /tasks/analytics/manager`: member ID to completion summary
pub async fn manager_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<BTreeMap<Uuid, MemberSummary>>> {
    Ok(Json(state.analytics.manager_analytics(auth.user_id).await?))
}

/// `GET /tasks/analytics/member`
pub async fn member_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<MemberAnalytics>> {
    Ok(Json(state.analytics.member_analytics(auth.user_id).await?))
}
