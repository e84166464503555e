// src/services/task_store.rs

use chrono::Utc;
use sqlx::{SqlitePool, types::Json};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        task::{CreateTaskRequest, Task},
        user::{Requester, Role},
    },
    utils::html::clean_html,
};

/// Creates a task. Tasks are never updated afterwards.
pub async fn create_task(
    pool: &SqlitePool,
    requester: &Requester,
    payload: CreateTaskRequest,
) -> Result<Task, AppError> {
    requester.require_role(Role::Teacher, "create tasks")?;
    payload.validate()?;

    let title = clean_html(payload.title.trim());
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required.".to_string()));
    }
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(clean_html);

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (title, description, questions, teacher_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, title, description, questions, teacher_id, created_at
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(Json(&payload.questions))
    .bind(requester.id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create task: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        task_id = task.id,
        teacher_id = requester.id,
        questions = task.questions.len(),
        "Task created"
    );

    Ok(task)
}

/// The requesting teacher's own tasks, newest first.
pub async fn list_tasks(pool: &SqlitePool, requester: &Requester) -> Result<Vec<Task>, AppError> {
    requester.require_role(Role::Teacher, "view all tasks")?;

    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, questions, teacher_id, created_at
        FROM tasks
        WHERE teacher_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(requester.id)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}

pub async fn get_task(pool: &SqlitePool, task_id: i64) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, description, questions, teacher_id, created_at FROM tasks WHERE id = ?",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

/// Resolves a lesson's tasks in the order they were attached to it.
pub async fn tasks_for_lesson(pool: &SqlitePool, lesson_id: i64) -> Result<Vec<Task>, AppError> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT t.id, t.title, t.description, t.questions, t.teacher_id, t.created_at
        FROM lesson_tasks lt
        JOIN tasks t ON t.id = lt.task_id
        WHERE lt.lesson_id = ?
        ORDER BY lt.position
        "#,
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}
