// src/models/group.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::User;

/// Represents the 'student_groups' table: a teacher-owned roster.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub teacher_id: i64,
}

/// Group info including its students.
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub students: Vec<User>,
}
