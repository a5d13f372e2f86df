//! Task use-cases. Each one takes the caller resolved by the auth gate and
//! only ever touches rows that caller owns; a task owned by someone else
//! is reported exactly like a missing one.

use tracing::{debug, info};

use super::{
    dto::TaskRequest,
    repo::TaskStore,
    repo_types::{NewTask, Task, TaskChanges},
};
use crate::{
    auth::repo_types::User,
    error::{AppError, FieldError},
};

fn validate(req: &TaskRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if req.heading.trim().is_empty() {
        errors.push(FieldError::new("heading", "must not be empty"));
    }
    if req.description.trim().is_empty() {
        errors.push(FieldError::new("description", "must not be empty"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn known_id(id: i64) -> Result<i64, AppError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(AppError::NotFound)
    }
}

pub async fn create_task(
    tasks: &dyn TaskStore,
    owner: &User,
    req: TaskRequest,
) -> Result<Task, AppError> {
    validate(&req)?;
    let task = tasks
        .insert(NewTask {
            heading: req.heading,
            description: req.description,
            is_completed: req.is_completed,
            user_id: owner.id,
        })
        .await?;
    info!(user_id = owner.id, task_id = task.id, "task created");
    Ok(task)
}

pub async fn list_tasks(tasks: &dyn TaskStore, owner: &User) -> Result<Vec<Task>, AppError> {
    let rows = tasks.list_by_owner(owner.id).await?;
    debug!(user_id = owner.id, count = rows.len(), "tasks listed");
    Ok(rows)
}

pub async fn get_task(tasks: &dyn TaskStore, owner: &User, id: i64) -> Result<Task, AppError> {
    tasks
        .find_owned(owner.id, known_id(id)?)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn update_task(
    tasks: &dyn TaskStore,
    owner: &User,
    id: i64,
    req: TaskRequest,
) -> Result<Task, AppError> {
    let id = known_id(id)?;
    validate(&req)?;
    let changes = TaskChanges {
        heading: req.heading,
        description: req.description,
        is_completed: req.is_completed,
    };
    let task = tasks
        .update_owned(owner.id, id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = owner.id, task_id = id, "task updated");
    Ok(task)
}

pub async fn mark_task_done(tasks: &dyn TaskStore, owner: &User, id: i64) -> Result<(), AppError> {
    if !tasks.mark_done(owner.id, known_id(id)?).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = owner.id, task_id = id, "task marked done");
    Ok(())
}

pub async fn delete_task(tasks: &dyn TaskStore, owner: &User, id: i64) -> Result<(), AppError> {
    if !tasks.delete_owned(owner.id, known_id(id)?).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = owner.id, task_id = id, "task deleted");
    Ok(())
}
