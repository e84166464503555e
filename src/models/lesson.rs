// src/models/lesson.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::task::{PublicTask, Task};

/// Represents the 'lessons' table.
///
/// `end_time` is `None` while the lesson is active. It is only ever set by
/// the end-lesson operation, and only once.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub group_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Lesson {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}

/// DTO for starting a lesson. Task order defines question order.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartLessonRequest {
    pub group_id: i64,
    #[validate(length(min = 1, message = "At least one task is required."))]
    pub task_ids: Vec<i64>,
}

/// Tasks of a lesson, shaped for whoever asked.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LessonTasks {
    /// The owning teacher sees answer keys.
    Full(Vec<Task>),
    /// Students get the questions only.
    Public(Vec<PublicTask>),
}
