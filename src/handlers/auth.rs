// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::creator::{CreateCreatorRequest, LoginRequest},
    store::QuizStore,
    utils::{
        jwt::sign_jwt,
        password::{hash_password, verify_password},
    },
};

/// Registers a new quiz creator.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the creator object (excluding password).
pub async fn register(
    State(store): State<Arc<dyn QuizStore>>,
    Json(payload): Json<CreateCreatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let creator = store
        .create_creator(&payload.username, &hashed_password)
        .await?;

    tracing::info!("Registered creator '{}'", creator.username);

    Ok((StatusCode::CREATED, Json(creator)))
}

/// Authenticates a creator and returns a JWT token.
pub async fn login(
    State(store): State<Arc<dyn QuizStore>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let creator = store
        .find_creator_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &creator.password)? {
        return Err(AppError::AuthError(
            "Invalid username or password".to_string(),
        ));
    }

    let token = sign_jwt(&creator, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": creator.username
    })))
}
