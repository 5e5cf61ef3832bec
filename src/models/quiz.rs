// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    /// Six-digit join code handed out to participants.
    pub code: String,

    pub title: String,

    pub description: String,

    /// Time allowed for one attempt, in seconds.
    pub time_limit_secs: i32,

    /// Ordered questions, stored as a JSON array.
    /// Holds the answer key, so never serialize this to participants.
    pub questions: Json<Vec<Question>>,

    /// Inactive quizzes cannot be joined.
    pub is_active: bool,

    /// Optional hard deadline. When set it overrides `time_limit_secs`.
    pub ends_at: Option<DateTime<Utc>>,

    pub owner_id: i64,

    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Questions with the answer key stripped, safe to show before submission.
    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| PublicQuestion::from_question(index, q))
            .collect()
    }
}

/// A single multiple-choice question, including its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    /// 0-based index into `options`.
    pub correct_option: usize,
}

/// DTO for sending a question to a participant (excludes the answer key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
}

impl PublicQuestion {
    pub fn from_question(index: usize, question: &Question) -> Self {
        Self {
            index,
            text: question.text.clone(),
            options: question.options.clone(),
        }
    }
}

/// Quiz listing for the creator dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub code: String,
    pub title: String,
    pub question_count: usize,
    pub time_limit_secs: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            code: quiz.code.clone(),
            title: quiz.title.clone(),
            question_count: quiz.question_count(),
            time_limit_secs: quiz.time_limit_secs,
            is_active: quiz.is_active,
            created_at: quiz.created_at,
        }
    }
}

/// DTO for authoring a new quiz.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(min = 1, max = 86400))]
    pub time_limit_secs: i32,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 200))]
    #[validate(nested)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_correct_option))]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(length(min = 2, max = 10), custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl From<QuestionDraft> for Question {
    fn from(draft: QuestionDraft) -> Self {
        Self {
            text: draft.text,
            options: draft.options,
            correct_option: draft.correct_option,
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_correct_option(draft: &QuestionDraft) -> Result<(), validator::ValidationError> {
    if draft.correct_option >= draft.options.len() {
        return Err(validator::ValidationError::new("correct_option_out_of_range"));
    }
    Ok(())
}

/// DTO for toggling whether a quiz accepts new attempts.
#[derive(Debug, Deserialize)]
pub struct QuizStatusRequest {
    pub is_active: bool,
}
