use async_trait::async_trait;

use crate::{
    db::PgStore,
    error::StoreError,
    tasks::repo_types::{NewTask, Task, TaskChanges},
};

/// Task persistence. Every read and write except `insert` is scoped by
/// owner, and soft-deleted rows are invisible.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Tasks owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Task>, StoreError>;

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Task>, StoreError>;

    /// `None` when no live task `id` belongs to `owner`.
    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    /// Returns whether a row was marked.
    async fn mark_done(&self, owner: i64, id: i64) -> Result<bool, StoreError>;

    /// Returns whether a row was deleted.
    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (heading, description, is_completed, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, heading, description, is_completed, user_id, created_at, updated_at
            "#,
        )
        .bind(&task.heading)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(task.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, heading, description, is_completed, user_id, created_at, updated_at
            FROM tasks
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY id ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, heading, description, is_completed, user_id, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
               SET heading = $3, description = $4, is_completed = $5, updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, heading, description, is_completed, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&changes.heading)
        .bind(&changes.description)
        .bind(changes.is_completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn mark_done(&self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE tasks
               SET is_completed = true, updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE tasks
               SET deleted_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
