//! Task endpoints
//!
//! Managers assign and review; members list, start and submit their own.
//! Ownership is enforced by the lifecycle service, so a task that belongs to
//! someone else answers exactly like a missing one (404).

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use teamtask_shared::{
    auth::middleware::AuthContext,
    models::task::Task,
    services::{AssignTaskInput, AssignedTask, SubmitTaskInput},
};
use uuid::Uuid;
use validator::Validate;

/// Assign request
#[derive(Debug, Deserialize, Validate)]
pub struct AssignTaskRequest {
    /// Member receiving the task
    #[serde(alias = "assignedToId", alias = "assigned_to")]
    pub assigned_to_id: Uuid,

    /// Blank titles are rejected with 400
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Submit request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitTaskRequest {
    #[serde(default, alias = "deliverableLink")]
    #[validate(length(max = 2048, message = "Deliverable link is too long"))]
    pub deliverable_link: Option<String>,

    /// Base64 data URI of the completion proof
    #[serde(default, alias = "proofBase64", alias = "proof_base64")]
    pub proof: Option<String>,
}

/// `POST /tasks/assign` (manager)
pub async fn assign_task(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<AssignTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    req.validate()?;

    let task = state
        .lifecycle
        .assign_task(
            auth.user_id,
            AssignTaskInput {
                assigned_to: req.assigned_to_id,
                title: req.title,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks/assigned` (manager)
pub async fn list_assigned_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<AssignedTask>>> {
    Ok(Json(state.lifecycle.list_assigned_tasks(auth.user_id).await?))
}

/// `GET /tasks/my` (member)
pub async fn list_my_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.lifecycle.list_my_tasks(auth.user_id).await?))
}

/// `PUT /tasks/start/:id` (member)
pub async fn start_task(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let Path(task_id) = path?;
    Ok(Json(state.lifecycle.start_task(auth.user_id, task_id).await?))
}

/// `PUT /tasks/submit/:id` (member)
///
/// The proof, if any, is uploaded before the task is written; an upload
/// failure leaves the task as it was.
pub async fn submit_task(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Path(task_id) = path?;
    let Json(req) = payload?;
    req.validate()?;

    let task = state
        .lifecycle
        .submit_task(
            auth.user_id,
            task_id,
            SubmitTaskInput {
                deliverable_link: req.deliverable_link,
                proof: req.proof,
            },
        )
        .await?;

    Ok(Json(task))
}
