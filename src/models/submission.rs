// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One answer inside a submission.
///
/// `question_index` addresses the lesson's flattened question list: the
/// questions of every task, concatenated in the lesson's task order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
}

/// Represents the 'submissions' table. Written once per (lesson, student).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub lesson_id: i64,
    pub student_id: i64,
    /// Stored as a JSON array in the database.
    #[sqlx(json)]
    pub answers: Vec<Answer>,
    /// Percentage of multiple-choice questions answered correctly, 0..=100.
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

/// DTO for submitting answers.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<Answer>,
}

/// Outcome of marking attendance. A repeat call is still a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceOutcome {
    pub already_marked: bool,
}

/// A past lesson from the student's point of view.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonHistoryEntry {
    pub lesson_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
    /// Title of the lesson's first task.
    pub task_title: Option<String>,
}
