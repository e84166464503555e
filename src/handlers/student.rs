// src/handlers/student.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::Requester, services::submissions};

/// Past lessons and scores for the logged-in student.
pub async fn lesson_history(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
) -> Result<impl IntoResponse, AppError> {
    let history = submissions::lesson_history(&pool, &requester).await?;
    Ok(Json(history))
}
