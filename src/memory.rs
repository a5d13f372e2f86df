//! In-process store with the same semantics as `PgStore`: monotonic ids
//! starting at 1, unique emails, owner-scoped task access and soft delete.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::StoreError,
    tasks::{
        repo::TaskStore,
        repo_types::{NewTask, Task, TaskChanges},
    },
};

struct TaskRow {
    task: Task,
    deleted_at: Option<OffsetDateTime>,
}

impl TaskRow {
    fn is_live_for(&self, owner: i64, id: i64) -> bool {
        self.deleted_at.is_none() && self.task.id == id && self.task.user_id == owner
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<TaskRow>,
    last_user_id: i64,
    last_task_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of task rows ever written, soft-deleted ones included.
    pub async fn task_rows(&self) -> usize {
        self.tables.read().await.tasks.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email"));
        }
        t.last_user_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: t.last_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut t = self.tables.write().await;
        t.last_task_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = Task {
            id: t.last_task_id,
            heading: task.heading,
            description: task.description,
            is_completed: task.is_completed,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        };
        t.tasks.push(TaskRow {
            task: row.clone(),
            deleted_at: None,
        });
        Ok(row)
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Task>, StoreError> {
        let t = self.tables.read().await;
        // rows are appended with increasing ids, so this is creation order
        Ok(t.tasks
            .iter()
            .filter(|r| r.deleted_at.is_none() && r.task.user_id == owner)
            .map(|r| r.task.clone())
            .collect())
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Task>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.tasks
            .iter()
            .find(|r| r.is_live_for(owner, id))
            .map(|r| r.task.clone()))
    }

    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let mut t = self.tables.write().await;
        let Some(row) = t.tasks.iter_mut().find(|r| r.is_live_for(owner, id)) else {
            return Ok(None);
        };
        row.task.heading = changes.heading;
        row.task.description = changes.description;
        row.task.is_completed = changes.is_completed;
        row.task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.task.clone()))
    }

    async fn mark_done(&self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        match t.tasks.iter_mut().find(|r| r.is_live_for(owner, id)) {
            Some(row) => {
                row.task.is_completed = true;
                row.task.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        match t.tasks.iter_mut().find(|r| r.is_live_for(owner, id)) {
            Some(row) => {
                row.deleted_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "A".into(),
            last_name: "B".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    fn new_task(owner: i64, heading: &str) -> NewTask {
        NewTask {
            heading: heading.into(),
            description: "d".into(),
            is_completed: false,
            user_id: owner,
        }
    }

    #[tokio::test]
    async fn user_ids_are_monotonic_and_emails_unique() {
        let store = MemoryStore::new();
        let a = UserStore::insert(&store, new_user("a@b.com")).await.unwrap();
        let b = UserStore::insert(&store, new_user("c@d.com")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let err = UserStore::insert(&store, new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict("email")));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("a@b.com")).await.unwrap();
        assert!(store.find_by_email("A@B.com").await.unwrap().is_none());
        assert!(store.find_by_email("a@b.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn soft_deleted_tasks_are_hidden_but_retained() {
        let store = MemoryStore::new();
        let t = TaskStore::insert(&store, new_task(1, "x")).await.unwrap();
        assert!(store.delete_owned(1, t.id).await.unwrap());
        assert!(!store.delete_owned(1, t.id).await.unwrap());
        assert!(store.find_owned(1, t.id).await.unwrap().is_none());
        assert!(store.list_by_owner(1).await.unwrap().is_empty());
        assert_eq!(store.task_rows().await, 1);
    }

    #[tokio::test]
    async fn tasks_are_scoped_by_owner() {
        let store = MemoryStore::new();
        let t = TaskStore::insert(&store, new_task(1, "mine")).await.unwrap();
        TaskStore::insert(&store, new_task(2, "theirs")).await.unwrap();

        assert!(store.find_owned(2, t.id).await.unwrap().is_none());
        assert!(!store.mark_done(2, t.id).await.unwrap());
        let listed = store.list_by_owner(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].heading, "mine");
    }
}
