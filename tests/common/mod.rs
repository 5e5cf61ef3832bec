// tests/common/mod.rs
#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use quizroom::{config::Config, routes, state::AppState, store::MemoryStore};
use serde_json::{Value, json};

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        tab_switch_limit: 3,
        forced_submit_grace_secs: 0,
        session_retention_secs: 600,
        creator_username: None,
        creator_password: None,
    }
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app() -> String {
    spawn_app_with(test_config()).await
}

/// Like `spawn_app`, with custom settings and a fast session sweep.
pub async fn spawn_app_with(config: Config) -> String {
    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    state.sessions.spawn_reaper(Duration::from_millis(50));
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a creator with a unique name and returns its bearer token.
pub async fn creator_token(client: &reqwest::Client, address: &str) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let register = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

/// Three questions; the correct option is always index 1.
pub fn quiz_draft(time_limit_secs: i32) -> Value {
    json!({
        "title": "Rust basics",
        "description": "<p>Warm-up</p>",
        "time_limit_secs": time_limit_secs,
        "questions": [
            { "text": "Ownership moves on?", "options": ["copy", "assignment"], "correct_option": 1 },
            { "text": "Borrow checker runs at?", "options": ["runtime", "compile time", "link time"], "correct_option": 1 },
            { "text": "Default integer type?", "options": ["u32", "i32"], "correct_option": 1 }
        ]
    })
}

/// Creates a quiz as the given creator and returns its join code.
pub async fn create_quiz(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    draft: &Value,
) -> String {
    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(token)
        .json(draft)
        .send()
        .await
        .expect("Create quiz failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["code"].as_str().expect("Code not found").to_string()
}

/// Joins a quiz and returns the session id.
pub async fn join(client: &reqwest::Client, address: &str, code: &str, name: &str) -> String {
    let response = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({
            "code": code,
            "participant": { "name": name, "roll_number": "CS-01", "branch": "CSE" }
        }))
        .send()
        .await
        .expect("Join failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["session_id"].as_str().expect("Session id not found").to_string()
}
