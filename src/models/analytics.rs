// src/models/analytics.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::User;

/// A student's score for one lesson.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub student_id: i64,
    pub student_name: String,
    pub score: i64,
}

/// A student who joined the lesson.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeEntry {
    pub id: i64,
    pub student_name: String,
    pub join_time: DateTime<Utc>,
}

/// Final report for a lesson.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAnalytics {
    pub lesson_id: i64,
    /// Rounded mean of all scores; 0 when nobody has submitted.
    pub average_score: i64,
    pub submission_count: usize,
    pub attendance_count: usize,
    /// Number of students on the group's roster.
    pub group_size: i64,
    pub submissions: Vec<ScoreEntry>,
    pub attendees: Vec<AttendeeEntry>,
}

/// Poll target for the teacher's live view. "Joined but not yet submitted"
/// is `attendees` minus `submitters` by id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLesson {
    pub lesson_id: i64,
    pub attendees: Vec<User>,
    pub submitters: Vec<User>,
}
