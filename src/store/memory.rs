// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    models::{
        creator::Creator,
        quiz::{Question, Quiz, QuizDraft, QuizSummary},
        submission::{AttemptSummary, LeaderboardEntry},
    },
    store::{QuizStore, StoreError},
};

#[derive(Default)]
struct Inner {
    quizzes: HashMap<String, Quiz>,
    attempts: Vec<AttemptSummary>,
    creators: Vec<Creator>,
    next_quiz_id: i64,
}

/// In-memory fake of the quiz database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with quizzes, keyed by their codes.
    pub fn with_quizzes(quizzes: Vec<Quiz>) -> Self {
        let next_quiz_id = quizzes.iter().map(|q| q.id).max().unwrap_or(0);
        let quizzes = quizzes.into_iter().map(|q| (q.code.clone(), q)).collect();
        Self {
            inner: RwLock::new(Inner {
                quizzes,
                next_quiz_id,
                ..Inner::default()
            }),
        }
    }

    /// Every recorded attempt, in submission order.
    pub async fn attempts(&self) -> Vec<AttemptSummary> {
        self.inner.read().await.attempts.clone()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn find_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        Ok(self.inner.read().await.quizzes.get(code).cloned())
    }

    async fn record_attempt(&self, summary: &AttemptSummary) -> Result<(), StoreError> {
        self.inner.write().await.attempts.push(summary.clone());
        Ok(())
    }

    async fn insert_quiz(
        &self,
        owner_id: i64,
        code: &str,
        draft: &QuizDraft,
    ) -> Result<Quiz, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.quizzes.contains_key(code) {
            return Err(StoreError::DuplicateCode(code.to_string()));
        }

        inner.next_quiz_id += 1;
        let quiz = Quiz {
            id: inner.next_quiz_id,
            code: code.to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            time_limit_secs: draft.time_limit_secs,
            questions: Json(draft.questions.iter().cloned().map(Question::from).collect()),
            is_active: true,
            ends_at: draft.ends_at,
            owner_id,
            created_at: Some(Utc::now()),
        };
        inner.quizzes.insert(quiz.code.clone(), quiz.clone());

        Ok(quiz)
    }

    async fn list_submissions(&self, code: &str) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let inner = self.inner.read().await;

        let mut entries: Vec<LeaderboardEntry> = inner
            .attempts
            .iter()
            .filter(|a| a.quiz_code == code)
            .map(LeaderboardEntry::from)
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });

        Ok(entries)
    }

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<QuizSummary>, StoreError> {
        let inner = self.inner.read().await;

        let mut quizzes: Vec<&Quiz> = inner
            .quizzes
            .values()
            .filter(|q| q.owner_id == owner_id)
            .collect();
        quizzes.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(quizzes.into_iter().map(QuizSummary::from).collect())
    }

    async fn set_quiz_active(
        &self,
        code: &str,
        owner_id: i64,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        match inner.quizzes.get_mut(code) {
            Some(quiz) if quiz.owner_id == owner_id => {
                quiz.is_active = is_active;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_creator(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Creator, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.creators.iter().any(|c| c.username == username) {
            return Err(StoreError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }

        let creator = Creator {
            id: inner.creators.len() as i64 + 1,
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Some(Utc::now()),
        };
        inner.creators.push(creator.clone());

        Ok(creator)
    }

    async fn find_creator_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Creator>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .creators
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }
}
