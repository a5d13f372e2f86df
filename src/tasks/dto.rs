use serde::{Deserialize, Serialize};

use super::repo_types::Task;

/// Body for create and update. Missing text fields deserialize empty and
/// are rejected by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskRequest {
    pub heading: String,
    pub description: String,
    #[serde(alias = "IsCompleted")]
    pub is_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
