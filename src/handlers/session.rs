// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{participant::Participant, quiz::PublicQuestion},
    services::live::{LiveSession, SessionRegistry},
    session::{MonitorAction, SessionState, Signal},
    state::AppState,
};

/// DTO for joining a quiz.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
    pub participant: Participant,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub session_id: Uuid,
    pub quiz_title: Option<String>,
    pub questions: Vec<PublicQuestion>,
    pub remaining_secs: u32,
    pub tab_switch_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_index: usize,
    pub option_index: usize,
}

/// Either a relative move (`delta`) or a jump (`index`).
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub delta: Option<i64>,
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// The participant confirmed the "submit quiz?" prompt.
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct SignalResponse {
    #[serde(flatten)]
    pub action: MonitorAction,
    pub suppress: bool,
    pub tab_switches: u32,
    pub state: SessionState,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub since: Option<usize>,
}

async fn find_session(
    registry: &SessionRegistry,
    id: Uuid,
) -> Result<Arc<LiveSession>, AppError> {
    registry
        .get(id)
        .await
        .ok_or(AppError::NotFound(format!("Session '{}' not found", id)))
}

/// Joins a quiz by code. Starts the countdown on success.
pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (live, questions) =
        LiveSession::join(state.store.clone(), state.monitor, &req.code, &req.participant).await?;

    let snapshot = live.snapshot().await;
    state.sessions.insert(live).await;

    Ok((
        StatusCode::CREATED,
        Json(JoinResponse {
            session_id: snapshot.session_id,
            quiz_title: snapshot.session.quiz_title,
            questions,
            remaining_secs: snapshot.session.remaining_secs,
            tab_switch_limit: state.monitor.config().tab_switch_limit,
        }),
    ))
}

/// Current state of the attempt, for rendering.
pub async fn get_session(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let live = find_session(&registry, id).await?;
    Ok(Json(live.snapshot().await))
}

pub async fn select_answer(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let live = find_session(&registry, id).await?;
    live.select_answer(req.question_index, req.option_index).await?;

    Ok(Json(live.snapshot().await))
}

pub async fn navigate(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let live = find_session(&registry, id).await?;

    match (req.delta, req.index) {
        (Some(delta), None) => live.navigate(delta).await?,
        (None, Some(index)) => live.jump_to(index).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide exactly one of 'delta' or 'index'".to_string(),
            ));
        }
    };

    Ok(Json(live.snapshot().await))
}

/// Feeds a browser signal to the anti-cheat monitor.
/// `suppress: true` tells the client to cancel the default action.
pub async fn report_signal(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Json(signal): Json<Signal>,
) -> Result<impl IntoResponse, AppError> {
    let live = find_session(&registry, id).await?;
    let action = live.signal(&signal).await;
    let snapshot = live.snapshot().await;

    Ok(Json(SignalResponse {
        action,
        suppress: action.suppress(),
        tab_switches: snapshot.session.tab_switches,
        state: snapshot.session.state,
    }))
}

/// Participant-initiated submit. Requires explicit confirmation.
pub async fn submit(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !req.confirmed {
        return Err(AppError::BadRequest(
            "Submission must be confirmed".to_string(),
        ));
    }

    let live = find_session(&registry, id).await?;
    let result = live.submit().await?;

    Ok(Json(result))
}

/// Warnings, forced submits and state changes recorded for the session.
pub async fn list_events(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let live = find_session(&registry, id).await?;
    Ok(Json(live.events_since(query.since.unwrap_or(0))))
}

/// Leaves the quiz: stops the countdown and forgets the session.
pub async fn leave(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let live = registry
        .remove(id)
        .await
        .ok_or(AppError::NotFound(format!("Session '{}' not found", id)))?;
    live.leave().await;

    Ok(Json(json!({ "session_id": id, "left": true })))
}
