// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::{
    models::{
        creator::Creator,
        quiz::{Question, Quiz, QuizDraft, QuizSummary},
        submission::{AttemptSummary, LeaderboardEntry},
    },
    store::{QuizStore, StoreError},
};

const QUIZ_COLUMNS: &str = r#"
    id,
    code,
    title,
    description,
    time_limit_secs,
    questions,
    is_active,
    ends_at,
    owner_id,
    created_at
"#;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn find_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE code = $1",
            QUIZ_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn record_attempt(&self, summary: &AttemptSummary) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attempts (
                quiz_code, name, roll_number, branch,
                score, total, percentage, tab_switches,
                answers, trigger, started_at, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&summary.quiz_code)
        .bind(&summary.participant.name)
        .bind(&summary.participant.roll_number)
        .bind(&summary.participant.branch)
        .bind(summary.score.correct as i32)
        .bind(summary.score.total as i32)
        .bind(summary.score.percentage as i32)
        .bind(summary.tab_switches as i32)
        .bind(Json(summary.answers.clone()))
        .bind(summary.trigger.as_str())
        .bind(summary.started_at)
        .bind(summary.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record attempt: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(())
    }

    async fn insert_quiz(
        &self,
        owner_id: i64,
        code: &str,
        draft: &QuizDraft,
    ) -> Result<Quiz, StoreError> {
        let questions: Vec<Question> =
            draft.questions.iter().cloned().map(Question::from).collect();

        sqlx::query_as::<_, Quiz>(&format!(
            r#"
            INSERT INTO quizzes (code, title, description, time_limit_secs, questions, ends_at, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            QUIZ_COLUMNS
        ))
        .bind(code)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.time_limit_secs)
        .bind(Json(questions))
        .bind(draft.ends_at)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateCode(code.to_string())
            } else {
                tracing::error!("Failed to insert quiz: {:?}", e);
                StoreError::from(e)
            }
        })
    }

    async fn list_submissions(&self, code: &str) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT
                name,
                roll_number,
                branch,
                score,
                total,
                percentage,
                tab_switches,
                submitted_at
            FROM attempts
            WHERE quiz_code = $1
            ORDER BY score DESC, submitted_at ASC
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn list_quizzes_by_owner(&self, owner_id: i64) -> Result<Vec<QuizSummary>, StoreError> {
        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE owner_id = $1 ORDER BY id DESC",
            QUIZ_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes.iter().map(QuizSummary::from).collect())
    }

    async fn set_quiz_active(
        &self,
        code: &str,
        owner_id: i64,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE quizzes SET is_active = $1 WHERE code = $2 AND owner_id = $3")
                .bind(is_active)
                .bind(code)
                .bind(owner_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_creator(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Creator, StoreError> {
        sqlx::query_as::<_, Creator>(
            r#"
            INSERT INTO creators (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("Username '{}' already exists", username))
            } else {
                tracing::error!("Failed to create creator: {:?}", e);
                StoreError::from(e)
            }
        })
    }

    async fn find_creator_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Creator>, StoreError> {
        let creator = sqlx::query_as::<_, Creator>(
            "SELECT id, username, password, created_at FROM creators WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(creator)
    }
}
