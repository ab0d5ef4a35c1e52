//! Completion analytics
//!
//! Averages are taken over completed tasks that have both `started_at` and
//! `submitted_at`, computed in whole milliseconds and rounded half-up to
//! minutes. Tasks submitted without being started still count as completed
//! but do not contribute a duration.

use super::ServiceResult;
use crate::models::task::Task;
use crate::store::Stores;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

const MILLIS_PER_MINUTE: i128 = 60_000;

/// Per-member entry of the manager dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub name: String,
    pub profile_photo: Option<String>,
    pub completed_count: u64,
    pub average_completion_minutes: i64,
}

/// A member's own statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAnalytics {
    pub total_completed: u64,
    pub total_tasks: u64,
    pub average_completion_minutes: i64,
}

/// Mean start-to-submit time of `tasks`, in minutes rounded half-up
///
/// Negative durations count as zero.
///
/// ```
/// use chrono::{Duration, Utc};
/// use teamtask_shared::models::task::Task;
/// use teamtask_shared::services::analytics::average_completion_minutes;
/// use uuid::Uuid;
///
/// let t0 = Utc::now();
/// let mut task = Task::new("t".into(), None, Uuid::new_v4(), Uuid::new_v4(), t0);
/// task.start(t0).unwrap();
/// task.submit(t0 + Duration::seconds(90), None, None).unwrap();
///
/// assert_eq!(average_completion_minutes(&[task]), 2);
/// ```
pub fn average_completion_minutes<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> i64 {
    let (total_ms, count) = tasks
        .into_iter()
        .filter_map(|t| t.timestamps.completion_duration())
        .fold((0i128, 0i128), |(sum, n), d| {
            (sum + i128::from(d.num_milliseconds().max(0)), n + 1)
        });

    if count == 0 {
        return 0;
    }

    let divisor = count * MILLIS_PER_MINUTE;
    let rounded = (total_ms + divisor / 2) / divisor;
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Read-only statistics over the task store
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    stores: Stores,
}

impl AnalyticsService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Completion summary for every member of the manager's team
    ///
    /// A manager without a team gets an empty map.
    pub async fn manager_analytics(
        &self,
        manager_id: Uuid,
    ) -> ServiceResult<BTreeMap<Uuid, MemberSummary>> {
        let Some(team) = self.stores.teams.find_team_by_manager(manager_id).await? else {
            tracing::debug!(user_id = %manager_id, "Manager has no team, returning empty analytics");
            return Ok(BTreeMap::new());
        };

        let members = self.stores.teams.team_members(team.id).await?;
        let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let completed = self.stores.tasks.completed_tasks_for(&member_ids).await?;

        let mut by_member: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for task in completed {
            by_member.entry(task.assigned_to).or_default().push(task);
        }

        Ok(members
            .into_iter()
            .map(|member| {
                let tasks = by_member.remove(&member.id).unwrap_or_default();
                let summary = MemberSummary {
                    name: member.name,
                    profile_photo: member.profile_photo,
                    completed_count: tasks.len() as u64,
                    average_completion_minutes: average_completion_minutes(&tasks),
                };
                (member.id, summary)
            })
            .collect())
    }

    /// Statistics over the member's own tasks
    pub async fn member_analytics(&self, member_id: Uuid) -> ServiceResult<MemberAnalytics> {
        let completed = self.stores.tasks.completed_tasks_for(&[member_id]).await?;
        let total_tasks = self.stores.tasks.count_tasks_assigned_to(member_id).await?;

        Ok(MemberAnalytics {
            total_completed: completed.len() as u64,
            total_tasks,
            average_completion_minutes: average_completion_minutes(&completed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::team::Team;
    use crate::models::user::{CreateUser, Role, User};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn completed(member: Uuid, started: Option<i64>, submitted_after_secs: i64) -> Task {
        let mut task = Task::new("t".into(), None, member, Uuid::new_v4(), t0());
        if let Some(offset) = started {
            task.start(t0() + Duration::seconds(offset)).unwrap();
        }
        task.submit(t0() + Duration::seconds(submitted_after_secs), None, None)
            .unwrap();
        task
    }

    #[test]
    fn test_rounding_half_up() {
        let member = Uuid::new_v4();

        assert_eq!(average_completion_minutes(&[completed(member, Some(0), 90)]), 2);
        assert_eq!(average_completion_minutes(&[completed(member, Some(0), 89)]), 1);
        assert_eq!(average_completion_minutes(&[completed(member, Some(0), 29)]), 0);
        assert_eq!(average_completion_minutes(&[completed(member, Some(0), 30)]), 1);
    }

    #[test]
    fn test_average_over_qualifying_tasks_only() {
        let member = Uuid::new_v4();
        let tasks = vec![
            completed(member, Some(0), 60),
            completed(member, Some(0), 180),
            completed(member, None, 600),
        ];

        assert_eq!(average_completion_minutes(&tasks), 2);
    }

    #[test]
    fn test_average_empty_is_zero() {
        assert_eq!(average_completion_minutes(&[]), 0);
        assert_eq!(
            average_completion_minutes(&[completed(Uuid::new_v4(), None, 60)]),
            0
        );
    }

    async fn member_of(stores: &Stores, team: &Team, name: &str) -> User {
        let user = stores
            .users
            .create_user(
                CreateUser {
                    name: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".to_string(),
                    role: Role::Member,
                    team_id: team.id,
                    team_code: team.code.clone(),
                    profile_photo: Some(format!("https://photos/{name}")),
                }
                .into_user(t0()),
            )
            .await
            .unwrap();
        stores
            .teams
            .add_team_member(team.id, user.id, t0())
            .await
            .unwrap();
        user
    }

    #[tokio::test]
    async fn test_manager_without_team_gets_empty_map() {
        let service = AnalyticsService::new(Stores::in_memory());
        let result = service.manager_analytics(Uuid::new_v4()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_manager_analytics_per_member() {
        let stores = Stores::in_memory();
        let manager_id = Uuid::new_v4();
        let team = stores.teams.create_team(Team::new(t0())).await.unwrap();
        stores.teams.set_team_manager(team.id, manager_id).await.unwrap();

        let busy = member_of(&stores, &team, "busy").await;
        let idle = member_of(&stores, &team, "idle").await;

        stores.tasks.insert_task(completed(busy.id, Some(0), 90)).await.unwrap();
        stores.tasks.insert_task(completed(busy.id, None, 30)).await.unwrap();
        stores
            .tasks
            .insert_task(Task::new("open".into(), None, idle.id, manager_id, t0()))
            .await
            .unwrap();

        let service = AnalyticsService::new(stores);
        let result = service.manager_analytics(manager_id).await.unwrap();

        assert_eq!(result.len(), 2);
        let busy_summary = &result[&busy.id];
        assert_eq!(busy_summary.name, "busy");
        assert_eq!(busy_summary.completed_count, 2);
        assert_eq!(busy_summary.average_completion_minutes, 2);
        assert_eq!(busy_summary.profile_photo.as_deref(), Some("https://photos/busy"));

        let idle_summary = &result[&idle.id];
        assert_eq!(idle_summary.completed_count, 0);
        assert_eq!(idle_summary.average_completion_minutes, 0);
    }

    #[tokio::test]
    async fn test_member_analytics_counts_all_tasks() {
        let stores = Stores::in_memory();
        let member = Uuid::new_v4();

        stores.tasks.insert_task(completed(member, Some(0), 240)).await.unwrap();
        stores
            .tasks
            .insert_task(Task::new("open".into(), None, member, Uuid::new_v4(), t0()))
            .await
            .unwrap();

        let service = AnalyticsService::new(stores);
        let stats = service.member_analytics(member).await.unwrap();

        assert_eq!(
            stats,
            MemberAnalytics {
                total_completed: 1,
                total_tasks: 2,
                average_completion_minutes: 4,
            }
        );
    }
}
