// src/store/mod.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    creator::Creator,
    quiz::{Quiz, QuizDraft, QuizSummary},
    submission::{AttemptSummary, LeaderboardEntry},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another quiz already uses this join code.
    #[error("quiz code '{0}' is already taken")]
    DuplicateCode(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Data-access collaborator shared by the session core and the HTTP layer.
///
/// `MemoryStore` backs tests and database-less runs; `PgStore` is the
/// networked implementation.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Looks up a quiz by join code, active or not.
    async fn find_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError>;

    /// Persists a finished attempt.
    async fn record_attempt(&self, summary: &AttemptSummary) -> Result<(), StoreError>;

    /// Stores a new quiz under `code`. Fails with `DuplicateCode` on collision.
    async fn insert_quiz(
        &self,
        owner_id: i64,
        code: &str,
        draft: &QuizDraft,
    ) -> Result<Quiz, StoreError>;

    /// Submissions for a quiz, best score first, earliest first on ties.
    async fn list_submissions(&self, code: &str) -> Result<Vec<LeaderboardEntry>, StoreError>;

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<QuizSummary>, StoreError>;

    /// Returns `false` when no quiz with that code belongs to `owner_id`.
    async fn set_quiz_active(
        &self,
        code: &str,
        owner_id: i64,
        is_active: bool,
    ) -> Result<bool, StoreError>;

    /// Fails with `Conflict` when the username is taken.
    async fn create_creator(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Creator, StoreError>;

    async fn find_creator_by_username(&self, username: &str)
    -> Result<Option<Creator>, StoreError>;
}
