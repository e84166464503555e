// src/handlers/tasks.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        task::CreateTaskRequest,
        user::{Requester, Role},
    },
    services::task_store,
};

/// Lists the requesting teacher's tasks.
pub async fn list_tasks(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = task_store::list_tasks(&pool, &requester).await?;
    Ok(Json(tasks))
}

/// Creates a task. Teacher only.
pub async fn create_task(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    requester.require_role(Role::Teacher, "create tasks")?;
    let Json(payload) = payload?;

    let task = task_store::create_task(&pool, &requester, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Task details. Students do not get the answer key.
pub async fn get_task(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let task = task_store::get_task(&pool, id).await?;

    Ok(match requester.role {
        Role::Teacher => Json(task).into_response(),
        Role::Student => Json(task.to_public()).into_response(),
    })
}
