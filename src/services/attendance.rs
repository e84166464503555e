// src/services/attendance.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{submission::AttendanceOutcome, user::Requester},
    services::lessons,
};

/// Records that the student joined the lesson.
///
/// Safe to call repeatedly, also after the lesson has ended: the UNIQUE
/// (lesson_id, student_id) constraint decides the winner and every later
/// call reports `already_marked`. Only a first mark on an ended lesson is
/// refused.
pub async fn mark_attendance(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
) -> Result<AttendanceOutcome, AppError> {
    let lesson = lessons::authorize_student(pool, requester, lesson_id, "mark attendance").await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance (lesson_id, student_id, join_time)
        SELECT ?, ?, ?
        WHERE EXISTS (SELECT 1 FROM lessons WHERE id = ? AND end_time IS NULL)
        "#,
    )
    .bind(lesson.id)
    .bind(requester.id)
    .bind(Utc::now())
    .bind(lesson.id)
    .execute(pool)
    .await;

    match inserted {
        Ok(result) if result.rows_affected() == 1 => {
            tracing::info!(lesson_id = lesson.id, student_id = requester.id, "Attendance marked");
            Ok(AttendanceOutcome {
                already_marked: false,
            })
        }
        // Nothing inserted: the lesson has ended.
        Ok(_) => {
            if has_attended(pool, lesson.id, requester.id).await? {
                Ok(AttendanceOutcome {
                    already_marked: true,
                })
            } else {
                Err(lessons::lesson_ended())
            }
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(
                lesson_id = lesson.id,
                student_id = requester.id,
                "Attendance already marked"
            );
            Ok(AttendanceOutcome {
                already_marked: true,
            })
        }
        Err(e) => {
            tracing::error!("Failed to mark attendance: {:?}", e);
            Err(AppError::from(e))
        }
    }
}

async fn has_attended(
    pool: &SqlitePool,
    lesson_id: i64,
    student_id: i64,
) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM attendance WHERE lesson_id = ? AND student_id = ?",
    )
    .bind(lesson_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}
