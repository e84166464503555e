// src/services/lessons.rs

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_foreign_key_violation},
    models::{
        lesson::{Lesson, LessonTasks, StartLessonRequest},
        user::{Requester, Role},
    },
    services::{groups, task_store},
};

/// Opens a lesson for one of the requester's groups.
///
/// The lesson row and its task links are written in one transaction:
/// if any task id is unknown, nothing is persisted.
pub async fn start_lesson(
    pool: &SqlitePool,
    requester: &Requester,
    payload: StartLessonRequest,
) -> Result<Lesson, AppError> {
    requester.require_role(Role::Teacher, "start lessons")?;
    payload.validate()?;

    if payload.task_ids.iter().any(|id| *id <= 0) {
        return Err(AppError::BadRequest("Task ids must be positive.".to_string()));
    }
    let mut seen = HashSet::new();
    if !payload.task_ids.iter().all(|id| seen.insert(*id)) {
        return Err(AppError::BadRequest(
            "A task can only be added to a lesson once.".to_string(),
        ));
    }

    let group = groups::get_group(pool, payload.group_id).await?;
    groups::ensure_owner(requester, &group)?;

    let mut tx = pool.begin().await?;

    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        INSERT INTO lessons (group_id, start_time)
        VALUES (?, ?)
        RETURNING id, group_id, start_time, end_time
        "#,
    )
    .bind(group.id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for (position, task_id) in payload.task_ids.iter().enumerate() {
        sqlx::query("INSERT INTO lesson_tasks (lesson_id, task_id, position) VALUES (?, ?, ?)")
            .bind(lesson.id)
            .bind(task_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::NotFound(format!("Task {} not found", task_id))
                } else {
                    tracing::error!("Failed to attach task {} to lesson: {:?}", task_id, e);
                    AppError::from(e)
                }
            })?;
    }

    tx.commit().await?;

    tracing::info!(
        lesson_id = lesson.id,
        group_id = group.id,
        tasks = payload.task_ids.len(),
        "Lesson started"
    );

    Ok(lesson)
}

pub async fn get_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<Lesson, AppError> {
    sqlx::query_as::<_, Lesson>(
        "SELECT id, group_id, start_time, end_time FROM lessons WHERE id = ?",
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))
}

/// Teacher role plus ownership of the lesson's group.
pub async fn authorize_owner(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
    action: &str,
) -> Result<Lesson, AppError> {
    requester.require_role(Role::Teacher, action)?;
    let lesson = get_lesson(pool, lesson_id).await?;
    let group = groups::get_group(pool, lesson.group_id).await?;
    groups::ensure_owner(requester, &group)?;
    Ok(lesson)
}

/// Student role plus membership of the lesson's group.
pub async fn authorize_student(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
    action: &str,
) -> Result<Lesson, AppError> {
    requester.require_role(Role::Student, action)?;
    let lesson = get_lesson(pool, lesson_id).await?;
    if !groups::is_member(pool, lesson.group_id, requester.id).await? {
        return Err(AppError::Forbidden(
            "You are not a member of this lesson's group.".to_string(),
        ));
    }
    Ok(lesson)
}

pub fn lesson_ended() -> AppError {
    AppError::Conflict("This lesson has ended.".to_string())
}

/// Writes are only accepted while the lesson has no end time.
pub fn ensure_active(lesson: &Lesson) -> Result<(), AppError> {
    if lesson.is_active() {
        Ok(())
    } else {
        Err(lesson_ended())
    }
}

/// Tasks of a lesson in lesson order. Students receive them without answer keys.
pub async fn get_tasks_for_lesson(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
) -> Result<LessonTasks, AppError> {
    let lesson = get_lesson(pool, lesson_id).await?;
    let group = groups::get_group(pool, lesson.group_id).await?;
    groups::ensure_access(pool, requester, &group).await?;

    let tasks = task_store::tasks_for_lesson(pool, lesson.id).await?;

    Ok(match requester.role {
        Role::Teacher => LessonTasks::Full(tasks),
        Role::Student => LessonTasks::Public(tasks.iter().map(|t| t.to_public()).collect()),
    })
}

/// Closes a lesson. Only the first call sets the end time.
pub async fn end_lesson(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
) -> Result<Lesson, AppError> {
    let lesson = authorize_owner(pool, requester, lesson_id, "end lessons").await?;

    let ended = sqlx::query_as::<_, Lesson>(
        r#"
        UPDATE lessons SET end_time = ?
        WHERE id = ? AND end_time IS NULL
        RETURNING id, group_id, start_time, end_time
        "#,
    )
    .bind(Utc::now())
    .bind(lesson.id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("This lesson has already ended.".to_string()))?;

    tracing::info!(lesson_id = ended.id, "Lesson ended");

    Ok(ended)
}

/// Newest lesson of the group that has not ended.
pub async fn active_lesson_for_group(
    pool: &SqlitePool,
    requester: &Requester,
    group_id: i64,
) -> Result<Lesson, AppError> {
    let group = groups::get_group(pool, group_id).await?;
    groups::ensure_access(pool, requester, &group).await?;

    sqlx::query_as::<_, Lesson>(
        r#"
        SELECT id, group_id, start_time, end_time
        FROM lessons
        WHERE group_id = ? AND end_time IS NULL
        ORDER BY start_time DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(group.id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No active lesson found".to_string()))
}
