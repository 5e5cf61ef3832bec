// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, quiz, session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, sessions).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, live sessions, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Authoring surface: creators only.
    let quiz_routes = Router::new()
        .route("/", post(quiz::create_quiz).get(quiz::list_my_quizzes))
        .route("/{code}/status", put(quiz::set_quiz_status))
        .route("/{code}/leaderboard", get(quiz::get_leaderboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Participant surface: the session id is the capability.
    let session_routes = Router::new()
        .route("/", post(session::join))
        .route("/{id}", get(session::get_session).delete(session::leave))
        .route("/{id}/answers", put(session::select_answer))
        .route("/{id}/navigate", post(session::navigate))
        .route("/{id}/signals", post(session::report_signal))
        .route("/{id}/submit", post(session::submit))
        .route("/{id}/events", get(session::list_events));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
