//! Role and ownership checks used by services
//!
//! Route groups are already gated by role in middleware. Services check the
//! role stored on the user record with [`require_role`], and task mutations
//! go through [`ensure_task_owner`].

use uuid::Uuid;

use crate::models::task::Task;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller has the wrong role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Caller is not the task's assignee
    #[error("Not authorized to access this task")]
    NotOwner,
}

/// Requires `actual` to be `required`
pub fn require_role(actual: Role, required: Role) -> Result<(), AuthzError> {
    if actual == required {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole { required, actual })
    }
}

/// Requires `user_id` to be the task's assignee
pub fn ensure_task_owner(task: &Task, user_id: Uuid) -> Result<(), AuthzError> {
    if task.assigned_to == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Member, Role::Member).is_ok());
        assert_eq!(
            require_role(Role::Member, Role::Manager),
            Err(AuthzError::InsufficientRole {
                required: Role::Manager,
                actual: Role::Member
            })
        );
    }

    #[test]
    fn test_ensure_task_owner() {
        let member = Uuid::new_v4();
        let task = Task::new("t".into(), None, member, Uuid::new_v4(), Utc::now());

        assert!(ensure_task_owner(&task, member).is_ok());
        assert_eq!(
            ensure_task_owner(&task, Uuid::new_v4()),
            Err(AuthzError::NotOwner)
        );
    }
}
