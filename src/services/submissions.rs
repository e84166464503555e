// src/services/submissions.rs

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{SqlitePool, types::Json};

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        submission::{Answer, LessonHistoryEntry, Submission},
        task::{Question, QuestionKind, Task},
        user::{Requester, Role},
    },
    services::{lessons, round_half_up, task_store},
};

/// Result of grading one set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub correct: usize,
    /// Number of multiple-choice questions in the lesson.
    pub gradable: usize,
    /// 0..=100.
    pub score: i64,
}

/// Concatenates the questions of every task, in lesson order.
/// Answer `question_index` values address this list.
pub fn flatten_questions(tasks: &[Task]) -> Vec<&Question> {
    tasks.iter().flat_map(|t| t.questions.iter()).collect()
}

/// Scores answers against the flattened question list.
///
/// Only multiple-choice questions count. Answers pointing past the end of
/// the list, or at an open-ended question, are ignored, and only the first
/// answer for a given index is graded. A lesson with nothing to grade
/// scores 100.
pub fn grade(questions: &[&Question], answers: &[Answer]) -> Grade {
    let gradable = questions.iter().filter(|q| q.is_multiple_choice()).count();

    let mut graded = HashSet::new();
    let mut correct = 0;
    for answer in answers {
        if !graded.insert(answer.question_index) {
            continue;
        }
        if let Some(QuestionKind::MultipleChoice { correct_answer, .. }) =
            questions.get(answer.question_index).map(|q| &q.kind)
        {
            if answer.selected_answer.is_some() && answer.selected_answer == *correct_answer {
                correct += 1;
            }
        }
    }

    let score = if gradable == 0 {
        100
    } else {
        round_half_up(correct as i64 * 100, gradable as i64)
    };

    Grade {
        correct,
        gradable,
        score,
    }
}

/// Grades and stores the student's answers for a lesson. One submission
/// per (lesson, student); a second attempt is a `Conflict`.
pub async fn submit_answers(
    pool: &SqlitePool,
    requester: &Requester,
    lesson_id: i64,
    answers: Vec<Answer>,
) -> Result<Submission, AppError> {
    let lesson = lessons::authorize_student(pool, requester, lesson_id, "submit answers").await?;
    lessons::ensure_active(&lesson)?;

    let tasks = task_store::tasks_for_lesson(pool, lesson.id).await?;
    if tasks.is_empty() {
        return Err(AppError::NotFound("No tasks found for this lesson".to_string()));
    }

    let questions = flatten_questions(&tasks);
    let result = grade(&questions, &answers);

    // The lesson may have ended since the check above; the insert only
    // happens while `end_time` is still NULL.
    let submission = sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO submissions (lesson_id, student_id, answers, score, submitted_at)
        SELECT ?, ?, ?, ?, ?
        WHERE EXISTS (SELECT 1 FROM lessons WHERE id = ? AND end_time IS NULL)
        RETURNING id, lesson_id, student_id, answers, score, submitted_at
        "#,
    )
    .bind(lesson.id)
    .bind(requester.id)
    .bind(Json(&answers))
    .bind(result.score)
    .bind(Utc::now())
    .bind(lesson.id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You have already submitted answers for this lesson.".to_string())
        } else {
            tracing::error!("Failed to store submission: {:?}", e);
            AppError::from(e)
        }
    })?
    .ok_or_else(lessons::lesson_ended)?;

    tracing::info!(
        lesson_id = lesson.id,
        student_id = requester.id,
        correct = result.correct,
        gradable = result.gradable,
        score = result.score,
        "Answers submitted"
    );

    Ok(submission)
}

/// Lessons the student has submitted to, newest first.
pub async fn lesson_history(
    pool: &SqlitePool,
    requester: &Requester,
) -> Result<Vec<LessonHistoryEntry>, AppError> {
    requester.require_role(Role::Student, "view their history")?;

    let history = sqlx::query_as::<_, LessonHistoryEntry>(
        r#"
        SELECT
            l.id AS lesson_id,
            l.start_time,
            l.end_time,
            s.score,
            s.submitted_at,
            (
                SELECT t.title
                FROM lesson_tasks lt
                JOIN tasks t ON t.id = lt.task_id
                WHERE lt.lesson_id = l.id
                ORDER BY lt.position
                LIMIT 1
            ) AS task_title
        FROM submissions s
        JOIN lessons l ON l.id = s.lesson_id
        WHERE s.student_id = ?
        ORDER BY l.start_time DESC, l.id DESC
        "#,
    )
    .bind(requester.id)
    .fetch_all(pool)
    .await?;

    Ok(history)
}
