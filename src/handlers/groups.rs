// src/handlers/groups.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::Requester,
    services::{groups, lessons},
};

pub async fn list_groups(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
) -> Result<impl IntoResponse, AppError> {
    let groups = groups::list_groups(&pool, &requester).await?;
    Ok(Json(groups))
}

pub async fn get_group(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = groups::group_detail(&pool, &requester, id).await?;
    Ok(Json(detail))
}

/// The lesson students should join right now, if any.
pub async fn get_active_lesson(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = lessons::active_lesson_for_group(&pool, &requester, id).await?;
    Ok(Json(lesson))
}
