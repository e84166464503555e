// src/services/analytics.rs

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        analytics::{AttendeeEntry, LessonAnalytics, LiveLesson, ScoreEntry},
        user::{Requester, User},
    },
    services::{lessons, round_half_up},
};

/// Rounded mean of the scores; 0 for an empty list.
pub fn average_score(scores: &[i64]) -> i64 {
    if scores.is_empty() {
        return 0;
    }
    round_half_up(scores.iter().sum(), scores.len() as i64)
}

/// Scores, attendance and class average for a lesson the requester owns.
///
/// All reads run in one transaction so counts and lists agree with each other.
pub async fn lesson_analytics(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
) -> Result<LessonAnalytics, AppError> {
    let lesson = lessons::authorize_owner(pool, requester, lesson_id, "view analytics").await?;

    let mut tx = pool.begin().await?;

    let submissions = sqlx::query_as::<_, ScoreEntry>(
        r#"
        SELECT s.student_id, u.name AS student_name, s.score
        FROM submissions s
        JOIN users u ON u.id = s.student_id
        WHERE s.lesson_id = ?
        ORDER BY s.submitted_at, s.id
        "#,
    )
    .bind(lesson.id)
    .fetch_all(&mut *tx)
    .await?;

    let attendees = sqlx::query_as::<_, AttendeeEntry>(
        r#"
        SELECT u.id, u.name AS student_name, a.join_time
        FROM attendance a
        JOIN users u ON u.id = a.student_id
        WHERE a.lesson_id = ?
        ORDER BY a.join_time, a.id
        "#,
    )
    .bind(lesson.id)
    .fetch_all(&mut *tx)
    .await?;

    let group_size =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM group_students WHERE group_id = ?")
            .bind(lesson.group_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    let scores: Vec<i64> = submissions.iter().map(|s| s.score).collect();

    Ok(LessonAnalytics {
        lesson_id: lesson.id,
        average_score: average_score(&scores),
        submission_count: submissions.len(),
        attendance_count: attendees.len(),
        group_size,
        submissions,
        attendees,
    })
}

/// Who has joined and who has submitted, as of this call. Meant to be polled.
pub async fn live_lesson(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
) -> Result<LiveLesson, AppError> {
    let lesson = lessons::authorize_owner(pool, requester, lesson_id, "view live lessons").await?;

    let mut tx = pool.begin().await?;

    let attendees = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.role, u.personal_id
        FROM attendance a
        JOIN users u ON u.id = a.student_id
        WHERE a.lesson_id = ?
        ORDER BY a.join_time, a.id
        "#,
    )
    .bind(lesson.id)
    .fetch_all(&mut *tx)
    .await?;

    let submitters = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.role, u.personal_id
        FROM submissions s
        JOIN users u ON u.id = s.student_id
        WHERE s.lesson_id = ?
        ORDER BY s.submitted_at, s.id
        "#,
    )
    .bind(lesson.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(LiveLesson {
        lesson_id: lesson.id,
        attendees,
        submitters,
    })
}
