//! Task lifecycle
//!
//! Managers assign tasks to members of their own team; the assignee starts
//! and submits them. Ownership is checked here, not in the transport layer:
//! a task that does not exist and a task assigned to someone else produce the
//! same [`ServiceError::TaskNotFoundOrUnauthorized`].
//!
//! Start and submit are read-then-write on a single row with no version
//! check, so two concurrent submits for the same task resolve as last write
//! wins. A proof upload always completes before anything is written.

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::ensure_task_owner;
use crate::clock::Clock;
use crate::models::task::{InvalidTransition, Task, TaskStatus};
use crate::models::user::Role;
use crate::store::Stores;
use crate::upload::{ProofUploader, PROOF_FOLDER};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle rules that vary by deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Reject submitting a task that was never started
    pub require_start_before_submit: bool,
}

/// Input for assigning a task
#[derive(Debug, Clone)]
pub struct AssignTaskInput {
    pub assigned_to: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Input for submitting a task
#[derive(Debug, Clone, Default)]
pub struct SubmitTaskInput {
    pub deliverable_link: Option<String>,

    /// Base64 data URI of the proof, uploaded before the task is saved
    pub proof: Option<String>,
}

/// Task as seen by the manager who assigned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTask {
    #[serde(flatten)]
    pub task: Task,

    /// Display name of the assignee; `None` if the account is gone
    pub assigned_to_name: Option<String>,
}

/// Assigns, starts and submits tasks
#[derive(Clone)]
pub struct TaskLifecycleService {
    stores: Stores,
    uploader: Arc<dyn ProofUploader>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TaskLifecycleService {
    pub fn new(
        stores: Stores,
        uploader: Arc<dyn ProofUploader>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            stores,
            uploader,
            clock,
            policy,
        }
    }

    /// Creates a pending task for a member of the manager's team
    pub async fn assign_task(&self, manager_id: Uuid, input: AssignTaskInput) -> ServiceResult<Task> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("Title is required".to_string()));
        }

        let team = self
            .stores
            .teams
            .find_team_by_manager(manager_id)
            .await?
            .ok_or_else(|| ServiceError::Validation("You do not manage a team".to_string()))?;

        let assignee = self.stores.users.find_user(input.assigned_to).await?;
        let eligible = assignee
            .as_ref()
            .map(|u| u.role == Role::Member && u.team_id == team.id)
            .unwrap_or(false);
        if !eligible {
            return Err(ServiceError::Validation(
                "Assignee is not a member of your team".to_string(),
            ));
        }

        let task = Task::new(
            title.to_string(),
            non_blank(input.description),
            input.assigned_to,
            manager_id,
            self.clock.now(),
        );
        let task = self.stores.tasks.insert_task(task).await?;

        info!(task_id = %task.id, assigned_to = %task.assigned_to, assigned_by = %manager_id, "Task assigned");
        Ok(task)
    }

    /// Loads a task the member owns
    async fn owned_task(&self, member_id: Uuid, task_id: Uuid) -> ServiceResult<Task> {
        let task = self
            .stores
            .tasks
            .find_task(task_id)
            .await?
            .ok_or(ServiceError::TaskNotFoundOrUnauthorized)?;

        ensure_task_owner(&task, member_id).map_err(|e| {
            debug!(task_id = %task_id, user_id = %member_id, "Task accessed by non-owner");
            ServiceError::from(e)
        })?;

        Ok(task)
    }

    /// Moves a task to in progress and stamps `started_at`
    pub async fn start_task(&self, member_id: Uuid, task_id: Uuid) -> ServiceResult<Task> {
        let mut task = self.owned_task(member_id, task_id).await?;

        task.start(self.clock.now())?;
        let task = self.stores.tasks.save_task_progress(&task).await?;

        info!(task_id = %task.id, user_id = %member_id, "Task started");
        Ok(task)
    }

    /// Completes a task, uploading the proof first if one was sent
    pub async fn submit_task(
        &self,
        member_id: Uuid,
        task_id: Uuid,
        input: SubmitTaskInput,
    ) -> ServiceResult<Task> {
        let mut task = self.owned_task(member_id, task_id).await?;

        task.ensure_transition(TaskStatus::Completed)?;
        if self.policy.require_start_before_submit && task.status == TaskStatus::Pending {
            return Err(InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Completed,
            }
            .into());
        }

        let proof_url = match non_blank(input.proof) {
            Some(payload) => Some(self.uploader.upload(&payload, PROOF_FOLDER).await?),
            None => None,
        };

        task.submit(self.clock.now(), non_blank(input.deliverable_link), proof_url)?;
        let task = self.stores.tasks.save_task_progress(&task).await?;

        info!(
            task_id = %task.id,
            user_id = %member_id,
            has_proof = task.completion_proof.is_some(),
            "Task submitted"
        );
        Ok(task)
    }

    /// Tasks assigned to the member, newest first
    pub async fn list_my_tasks(&self, member_id: Uuid) -> ServiceResult<Vec<Task>> {
        Ok(self.stores.tasks.tasks_assigned_to(member_id).await?)
    }

    /// Tasks the manager assigned, newest first, with assignee names
    pub async fn list_assigned_tasks(&self, manager_id: Uuid) -> ServiceResult<Vec<AssignedTask>> {
        let tasks = self.stores.tasks.tasks_assigned_by(manager_id).await?;

        let mut assignee_ids: Vec<Uuid> = tasks.iter().map(|t| t.assigned_to).collect();
        assignee_ids.sort();
        assignee_ids.dedup();

        let names: HashMap<Uuid, String> = self
            .stores
            .users
            .find_users(&assignee_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| AssignedTask {
                assigned_to_name: names.get(&task.assigned_to).cloned(),
                task,
            })
            .collect())
    }
}

impl std::fmt::Debug for TaskLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLifecycleService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
