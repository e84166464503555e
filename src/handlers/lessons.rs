// src/handlers/lessons.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        lesson::StartLessonRequest,
        submission::SubmitAnswersRequest,
        user::{Requester, Role},
    },
    services::{analytics, attendance, lessons, submissions},
};

/// Starts a lesson for a group with an ordered list of tasks.
pub async fn start_lesson(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<StartLessonRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    requester.require_role(Role::Teacher, "start lessons")?;
    let Json(payload) = payload?;

    let lesson = lessons::start_lesson(&pool, &requester, payload).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn get_lesson_tasks(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = lessons::get_tasks_for_lesson(&pool, &requester, id).await?;
    Ok(Json(tasks))
}

/// Idempotent: a repeat call answers 200 with `alreadyMarked: true`.
pub async fn mark_attendance(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = attendance::mark_attendance(&pool, &requester, id).await?;

    let (status, message) = if outcome.already_marked {
        (StatusCode::OK, "Attendance already marked")
    } else {
        (StatusCode::CREATED, "Attendance marked")
    };

    Ok((
        status,
        Json(json!({
            "message": message,
            "alreadyMarked": outcome.already_marked,
        })),
    ))
}

/// Grades and stores the student's answers. Write-once.
pub async fn submit_answers(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
    payload: Result<Json<SubmitAnswersRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    requester.require_role(Role::Student, "submit answers")?;
    let Json(payload) = payload?;

    let submission = submissions::submit_answers(&pool, &requester, id, payload.answers).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn get_analytics(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = analytics::lesson_analytics(&pool, &requester, id).await?;
    Ok(Json(report))
}

/// Poll target for the teacher's live view.
pub async fn get_live(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let live = analytics::live_lesson(&pool, &requester, id).await?;
    Ok(Json(live))
}

pub async fn end_lesson(
    State(pool): State<SqlitePool>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = lessons::end_lesson(&pool, &requester, id).await?;
    Ok(Json(lesson))
}
