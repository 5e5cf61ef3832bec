// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::quiz::{QuizDraft, QuizStatusRequest, QuizSummary},
    services::authoring,
    store::QuizStore,
    utils::jwt::Claims,
};

/// Authors a new quiz and returns its join code.
pub async fn create_quiz(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    Json(draft): Json<QuizDraft>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.creator_id()?;
    let quiz = authoring::create_quiz(store.as_ref(), owner_id, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "code": quiz.code,
            "quiz": QuizSummary::from(&quiz),
        })),
    ))
}

/// Lists the quizzes owned by the logged-in creator, newest first.
pub async fn list_my_quizzes(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.creator_id()?;
    let quizzes = store.list_quizzes_by_owner(owner_id).await?;

    Ok(Json(quizzes))
}

/// Opens or closes a quiz for new attempts.
/// Attempts already running are not affected.
pub async fn set_quiz_status(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    Json(payload): Json<QuizStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.creator_id()?;

    if !store
        .set_quiz_active(&code, owner_id, payload.is_active)
        .await?
    {
        return Err(AppError::NotFound(format!("Quiz '{}' not found", code)));
    }

    tracing::info!(
        "Creator {} set quiz {} active={}",
        owner_id,
        code,
        payload.is_active
    );

    Ok(Json(json!({ "code": code, "is_active": payload.is_active })))
}

/// Submissions for one of the creator's quizzes, best score first.
pub async fn get_leaderboard(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = claims.creator_id()?;

    let quiz = store
        .find_quiz_by_code(&code)
        .await?
        .ok_or(AppError::NotFound(format!("Quiz '{}' not found", code)))?;

    if quiz.owner_id != owner_id {
        return Err(AppError::Forbidden(
            "Only the quiz owner can view its leaderboard".to_string(),
        ));
    }

    let entries = store.list_submissions(&code).await?;

    Ok(Json(entries))
}
