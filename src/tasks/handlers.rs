use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MessageResponse, TaskListResponse, TaskRequest, TaskResponse},
    services,
};
use crate::{
    auth::AuthUser,
    error::{AppError, JsonBody, PathParam},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/task/create", post(create_task))
        .route("/tasks", get(list_tasks))
        .route(
            "/task/:id",
            get(get_task)
                .put(update_task)
                .post(mark_task_done)
                .delete(delete_task),
        )
}

#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<TaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let task = services::create_task(state.tasks.as_ref(), &user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = services::list_tasks(state.tasks.as_ref(), &user.0).await?;
    Ok(Json(TaskListResponse { tasks }))
}

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = services::get_task(state.tasks.as_ref(), &user.0, id).await?;
    Ok(Json(TaskResponse { task }))
}

#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<TaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = services::update_task(state.tasks.as_ref(), &user.0, id, payload).await?;
    Ok(Json(TaskResponse { task }))
}

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn mark_task_done(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    services::mark_task_done(state.tasks.as_ref(), &user.0, id).await?;
    Ok(Json(MessageResponse {
        message: "Marked the task as done",
    }))
}

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_task(state.tasks.as_ref(), &user.0, id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted",
    }))
}
