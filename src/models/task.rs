// src/models/task.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Tag carried by each question in its JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    OpenEnded,
}

/// How a question is answered and graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Scored by comparing the selected index with `correct_answer`.
    /// Stored questions without a usable key are kept but never match.
    MultipleChoice {
        options: Vec<String>,
        correct_answer: Option<usize>,
    },
    /// Stored verbatim, never scored.
    OpenEnded,
}

/// One question of a task.
///
/// The JSON shape (shared by the API and the `tasks.questions` column) is
/// `{question, type?, options?, correctAnswer?}`. A missing `type` is read
/// as multiple-choice so that older question sets keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub prompt: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn multiple_choice(prompt: &str, options: &[&str], correct_answer: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            kind: QuestionKind::MultipleChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
                correct_answer: Some(correct_answer),
            },
        }
    }

    pub fn open_ended(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            kind: QuestionKind::OpenEnded,
        }
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleChoice { .. })
    }

    /// Same question without the answer key.
    pub fn to_public(&self) -> PublicQuestion {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => PublicQuestion {
                question: self.prompt.clone(),
                question_type: QuestionType::MultipleChoice,
                options: options.clone(),
            },
            QuestionKind::OpenEnded => PublicQuestion {
                question: self.prompt.clone(),
                question_type: QuestionType::OpenEnded,
                options: Vec::new(),
            },
        }
    }
}

/// Wire/storage form of a question. Only used at the serde boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    question: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<usize>,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        let kind = match record.question_type.unwrap_or(QuestionType::MultipleChoice) {
            QuestionType::OpenEnded => QuestionKind::OpenEnded,
            QuestionType::MultipleChoice => {
                let options = record.options.unwrap_or_default();
                // A key outside the options loads as "no key" rather than
                // failing the whole question set.
                let correct_answer = record.correct_answer.filter(|i| *i < options.len());
                QuestionKind::MultipleChoice {
                    options,
                    correct_answer,
                }
            }
        };

        Question {
            prompt: record.question,
            kind,
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        match question.kind {
            QuestionKind::MultipleChoice {
                options,
                correct_answer,
            } => QuestionRecord {
                question: question.prompt,
                question_type: Some(QuestionType::MultipleChoice),
                options: Some(options),
                correct_answer,
            },
            QuestionKind::OpenEnded => QuestionRecord {
                question: question.prompt,
                question_type: Some(QuestionType::OpenEnded),
                options: None,
                correct_answer: None,
            },
        }
    }
}

/// DTO for sending a question to students (excludes the answer key).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Represents the 'tasks' table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Stored as a JSON array in the database.
    #[sqlx(json)]
    pub questions: Vec<Question>,
    pub teacher_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub fn to_public(&self) -> PublicTask {
        PublicTask {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self.questions.iter().map(Question::to_public).collect(),
            teacher_id: self.teacher_id,
        }
    }
}

/// Task as seen by a student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTask {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<PublicQuestion>,
    pub teacher_id: i64,
}

/// DTO for creating a new task.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(
        length(min = 1, message = "At least one question is required."),
        custom(function = validate_questions)
    )]
    pub questions: Vec<Question>,
}

fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    for question in questions {
        if question.prompt.trim().is_empty() {
            return Err(validator::ValidationError::new("question_text_cannot_be_empty"));
        }
        if let QuestionKind::MultipleChoice {
            options,
            correct_answer,
        } = &question.kind
        {
            if options.len() < 2 {
                return Err(validator::ValidationError::new("too_few_options"));
            }
            // Out-of-range keys were already dropped while decoding.
            if correct_answer.is_none() {
                return Err(validator::ValidationError::new("correct_answer_required"));
            }
            if options.iter().any(|o| o.len() > 500) {
                return Err(validator::ValidationError::new("option_too_long"));
            }
        }
    }
    Ok(())
}
