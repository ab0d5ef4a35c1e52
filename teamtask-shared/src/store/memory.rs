//! In-memory storage backend for tests and local runs

use super::{StoreError, StoreResult, TaskStore, TeamStore, UserStore};
use crate::models::task::{Task, TaskStatus};
use crate::models::team::Team;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Membership {
    team_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
}

/// Store keeping every record in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    teams: Arc<RwLock<HashMap<Uuid, Team>>>,
    memberships: Arc<RwLock<Vec<Membership>>>,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest assignment first; ID breaks ties so the order is stable
fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.timestamps
            .assigned_at
            .cmp(&a.timestamps.assigned_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::already_exists("User", user.email));
        }
        if users.contains_key(&user.id) {
            return Err(StoreError::already_exists("User", user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create_team(&self, team: Team) -> StoreResult<Team> {
        let mut teams = self.teams.write().await;
        if teams.values().any(|t| t.code == team.code) {
            return Err(StoreError::already_exists("Team", team.code));
        }
        teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn find_team_by_code(&self, code: &str) -> StoreResult<Option<Team>> {
        let teams = self.teams.read().await;
        Ok(teams.values().find(|t| t.code == code).cloned())
    }

    async fn find_team_by_manager(&self, manager_id: Uuid) -> StoreResult<Option<Team>> {
        let teams = self.teams.read().await;
        Ok(teams
            .values()
            .find(|t| t.manager_id == Some(manager_id))
            .cloned())
    }

    async fn set_team_manager(&self, team_id: Uuid, manager_id: Uuid) -> StoreResult<()> {
        let mut teams = self.teams.write().await;
        let team = teams
            .get_mut(&team_id)
            .ok_or_else(|| StoreError::not_found("Team", team_id.to_string()))?;
        team.manager_id = Some(manager_id);
        Ok(())
    }

    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if !self.teams.read().await.contains_key(&team_id) {
            return Err(StoreError::not_found("Team", team_id.to_string()));
        }

        let mut memberships = self.memberships.write().await;
        let exists = memberships
            .iter()
            .any(|m| m.team_id == team_id && m.user_id == user_id);
        if !exists {
            memberships.push(Membership {
                team_id,
                user_id,
                joined_at,
            });
        }
        Ok(())
    }

    async fn team_members(&self, team_id: Uuid) -> StoreResult<Vec<User>> {
        let mut joined: Vec<Membership> = self
            .memberships
            .read()
            .await
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        joined.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let users = self.users.read().await;
        Ok(joined
            .iter()
            .filter_map(|m| users.get(&m.user_id).cloned())
            .collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::already_exists("Task", task.id.to_string()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn save_task_progress(&self, task: &Task) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .get_mut(&task.id)
            .ok_or_else(|| StoreError::not_found("Task", task.id.to_string()))?;

        stored.status = task.status;
        stored.deliverable_link = task.deliverable_link.clone();
        stored.completion_proof = task.completion_proof.clone();
        stored.timestamps.started_at = task.timestamps.started_at;
        stored.timestamps.submitted_at = task.timestamps.submitted_at;
        stored.updated_at = task.updated_at;
        Ok(stored.clone())
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut found: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.assigned_to == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn tasks_assigned_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut found: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.assigned_by == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn completed_tasks_for(&self, user_ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        let mut found: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Completed && user_ids.contains(&t.assigned_to))
            .cloned()
            .collect();
        sort_newest_first(&mut found);
        Ok(found)
    }

    async fn count_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<u64> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| t.assigned_to == user_id).count() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{CreateUser, Role};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn user(email: &str, role: Role, team: &Team) -> User {
        CreateUser {
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
            team_id: team.id,
            team_code: team.code.clone(),
            profile_photo: None,
        }
        .into_user(now())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let team = store.create_team(Team::new(now())).await.unwrap();

        store
            .create_user(user("ada@example.com", Role::Manager, &team))
            .await
            .unwrap();
        let err = store
            .create_user(user("ADA@example.com", Role::Member, &team))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert!(store
            .find_user_by_email("Ada@Example.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_team_code_rejected() {
        let store = MemoryStore::new();
        let team = Team::new(now());
        let mut clash = Team::new(now());
        clash.code = team.code.clone();

        store.create_team(team).await.unwrap();
        assert!(matches!(
            store.create_team(clash).await,
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_team_members_in_join_order() {
        let store = MemoryStore::new();
        let team = store.create_team(Team::new(now())).await.unwrap();
        let first = store
            .create_user(user("first@example.com", Role::Member, &team))
            .await
            .unwrap();
        let second = store
            .create_user(user("second@example.com", Role::Member, &team))
            .await
            .unwrap();

        store
            .add_team_member(team.id, second.id, now() + Duration::minutes(1))
            .await
            .unwrap();
        store.add_team_member(team.id, first.id, now()).await.unwrap();
        store.add_team_member(team.id, first.id, now()).await.unwrap();

        let members = store.team_members(team.id).await.unwrap();
        let ids: Vec<Uuid> = members.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_tasks_listed_newest_first() {
        let store = MemoryStore::new();
        let manager = Uuid::new_v4();
        let member = Uuid::new_v4();

        let older = Task::new("older".into(), None, member, manager, now());
        let newer = Task::new(
            "newer".into(),
            None,
            member,
            manager,
            now() + Duration::hours(1),
        );
        store.insert_task(older).await.unwrap();
        store.insert_task(newer).await.unwrap();

        let mine = store.tasks_assigned_to(member).await.unwrap();
        assert_eq!(mine[0].title, "newer");
        assert_eq!(mine[1].title, "older");

        let assigned = store.tasks_assigned_by(manager).await.unwrap();
        assert_eq!(assigned.len(), 2);
        assert_eq!(store.count_tasks_assigned_to(member).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_progress_and_completed_filter() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let mut task = store
            .insert_task(Task::new("t".into(), None, member, Uuid::new_v4(), now()))
            .await
            .unwrap();

        assert!(store.completed_tasks_for(&[member]).await.unwrap().is_empty());

        task.submit(now() + Duration::minutes(3), None, None).unwrap();
        let saved = store.save_task_progress(&task).await.unwrap();
        assert_eq!(saved.status, TaskStatus::Completed);

        let completed = store.completed_tasks_for(&[member]).await.unwrap();
        assert_eq!(completed.len(), 1);
    }

    #[tokio::test]
    async fn test_save_progress_missing_task() {
        let store = MemoryStore::new();
        let task = Task::new("t".into(), None, Uuid::new_v4(), Uuid::new_v4(), now());

        assert!(matches!(
            store.save_task_progress(&task).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
