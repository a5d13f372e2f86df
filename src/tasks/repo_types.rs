use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// A to-do item. `user_id` is fixed at creation.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub heading: String,
    pub description: String,
    pub is_completed: bool,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub heading: String,
    pub description: String,
    pub is_completed: bool,
    pub user_id: i64,
}

/// Replacement values for the mutable task fields.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub heading: String,
    pub description: String,
    pub is_completed: bool,
}
