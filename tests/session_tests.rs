// tests/session_tests.rs

mod common;

use std::time::Duration;

use common::{
    create_quiz, creator_token, join, quiz_draft, spawn_app, spawn_app_with, test_config,
};
use serde_json::{Value, json};

/// Polls the session until `done` holds, or gives up after ~5 seconds.
async fn wait_for(
    client: &reqwest::Client,
    address: &str,
    session: &str,
    done: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..100 {
        let snapshot: Value = client
            .get(format!("{}/api/sessions/{}", address, session))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if done(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("session {} never reached the expected state", session);
}

#[tokio::test]
async fn join_validates_code_and_participant() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let participant = json!({ "name": "Asha", "roll_number": "1", "branch": "CSE" });

    let short_code = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({ "code": "123", "participant": participant }))
        .send()
        .await
        .unwrap();
    assert_eq!(short_code.status().as_u16(), 400);

    let unknown = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({ "code": "999999", "participant": participant }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);

    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;
    let blank_name = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({
            "code": code,
            "participant": { "name": "   ", "roll_number": "1", "branch": "CSE" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank_name.status().as_u16(), 400);
}

#[tokio::test]
async fn join_hides_the_answer_key() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;

    let body: Value = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({
            "code": format!(" {} ", code),
            "participant": { "name": "Asha", "roll_number": "1", "branch": "CSE" }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["quiz_title"], "Rust basics");
    assert_eq!(body["remaining_secs"], 60);
    assert_eq!(body["tab_switch_limit"], 3);

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[1]["index"], 1);
    assert!(questions.iter().all(|q| q.get("correct_option").is_none()));
}

#[tokio::test]
async fn answer_and_navigate() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;
    let session = join(&client, &address, &code, "Asha").await;

    let answered: Value = client
        .put(format!("{}/api/sessions/{}/answers", address, session))
        .json(&json!({ "question_index": 0, "option_index": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answered["answers"]["0"], 0);

    // Changing the selection replaces it.
    let changed: Value = client
        .put(format!("{}/api/sessions/{}/answers", address, session))
        .json(&json!({ "question_index": 0, "option_index": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(changed["answers"]["0"], 1);

    let out_of_range = client
        .put(format!("{}/api/sessions/{}/answers", address, session))
        .json(&json!({ "question_index": 0, "option_index": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 400);

    let next: Value = client
        .post(format!("{}/api/sessions/{}/navigate", address, session))
        .json(&json!({ "delta": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(next["cursor"], 1);
    assert_eq!(next["question"]["index"], 1);

    let jumped: Value = client
        .post(format!("{}/api/sessions/{}/navigate", address, session))
        .json(&json!({ "index": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(jumped["cursor"], 2);

    // Relative moves clamp at the ends; jumps out of range are rejected.
    let past_end: Value = client
        .post(format!("{}/api/sessions/{}/navigate", address, session))
        .json(&json!({ "delta": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(past_end["cursor"], 2);

    let bad_jump = client
        .post(format!("{}/api/sessions/{}/navigate", address, session))
        .json(&json!({ "index": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_jump.status().as_u16(), 400);

    let ambiguous = client
        .post(format!("{}/api/sessions/{}/navigate", address, session))
        .json(&json!({ "delta": -1, "index": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(ambiguous.status().as_u16(), 400);
}

#[tokio::test]
async fn submit_needs_confirmation_and_happens_once() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;
    let session = join(&client, &address, &code, "Asha").await;

    for question_index in 0..2 {
        client
            .put(format!("{}/api/sessions/{}/answers", address, session))
            .json(&json!({ "question_index": question_index, "option_index": 1 }))
            .send()
            .await
            .unwrap();
    }

    let unconfirmed = client
        .post(format!("{}/api/sessions/{}/submit", address, session))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(unconfirmed.status().as_u16(), 400);

    let result: Value = client
        .post(format!("{}/api/sessions/{}/submit", address, session))
        .json(&json!({ "confirmed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"]["correct"], 2);
    assert_eq!(result["score"]["total"], 3);
    assert_eq!(result["score"]["percentage"], 67);
    assert_eq!(result["record"]["status"], "recorded");

    // Answers are frozen after submission.
    let late = client
        .put(format!("{}/api/sessions/{}/answers", address, session))
        .json(&json!({ "question_index": 2, "option_index": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(late.status().as_u16(), 409);

    // A second submit reports the same score without recording again.
    let again: Value = client
        .post(format!("{}/api/sessions/{}/submit", address, session))
        .json(&json!({ "confirmed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["score"]["percentage"], 67);

    let board: Vec<Value> = client
        .get(format!("{}/api/quizzes/{}/leaderboard", address, code))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["roll_number"], "CS-01");
}

#[tokio::test]
async fn signals_warn_then_force_submit() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;
    let session = join(&client, &address, &code, "Asha").await;

    let copy: Value = client
        .post(format!("{}/api/sessions/{}/signals", address, session))
        .json(&json!({ "type": "copy" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(copy["action"], "warned");
    assert_eq!(copy["suppress"], true);

    let devtools: Value = client
        .post(format!("{}/api/sessions/{}/signals", address, session))
        .json(&json!({ "type": "shortcut", "key": "i", "ctrl": true, "shift": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(devtools["suppress"], true);

    let harmless: Value = client
        .post(format!("{}/api/sessions/{}/signals", address, session))
        .json(&json!({ "type": "shortcut", "key": "c", "ctrl": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(harmless["action"], "ignored");

    for expected in 1..=2 {
        let warned: Value = client
            .post(format!("{}/api/sessions/{}/signals", address, session))
            .json(&json!({ "type": "visibility_lost" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(warned["action"], "warned");
        assert_eq!(warned["suppress"], false);
        assert_eq!(warned["tab_switches"], expected);
    }

    let last: Value = client
        .post(format!("{}/api/sessions/{}/signals", address, session))
        .json(&json!({ "type": "visibility_lost" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last["action"], "forced_submit_scheduled");
    assert_eq!(last["tab_switches"], 3);

    let snapshot = wait_for(&client, &address, &session, |s| {
        s["record"]["status"] == "recorded"
    })
    .await;
    assert_eq!(snapshot["state"], "completed");
    assert_eq!(snapshot["trigger"], "anti_cheat");
    assert_eq!(snapshot["score"]["percentage"], 0);

    let events: Vec<Value> = client
        .get(format!("{}/api/sessions/{}/events", address, session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let warnings = events.iter().filter(|e| e["type"] == "warning").count();
    assert_eq!(warnings, 5);
    assert!(
        events
            .iter()
            .any(|e| e["type"] == "forced_submit" && e["trigger"] == "anti_cheat")
    );

    // Signals after completion are ignored.
    let after: Value = client
        .post(format!("{}/api/sessions/{}/signals", address, session))
        .json(&json!({ "type": "visibility_lost" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["action"], "ignored");
    assert_eq!(after["tab_switches"], 3);
}

#[tokio::test]
async fn timer_expiry_submits_automatically() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(1)).await;
    let session = join(&client, &address, &code, "Asha").await;

    client
        .put(format!("{}/api/sessions/{}/answers", address, session))
        .json(&json!({ "question_index": 0, "option_index": 1 }))
        .send()
        .await
        .unwrap();

    let snapshot = wait_for(&client, &address, &session, |s| {
        s["record"]["status"] == "recorded"
    })
    .await;
    assert_eq!(snapshot["state"], "completed");
    assert_eq!(snapshot["trigger"], "timer");
    assert_eq!(snapshot["remaining_secs"], 0);
    assert_eq!(snapshot["score"]["correct"], 1);
}

#[tokio::test]
async fn leave_forgets_the_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;
    let session = join(&client, &address, &code, "Asha").await;

    let left = client
        .delete(format!("{}/api/sessions/{}", address, session))
        .send()
        .await
        .unwrap();
    assert_eq!(left.status().as_u16(), 200);

    let gone = client
        .get(format!("{}/api/sessions/{}", address, session))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);

    let malformed = client
        .get(format!("{}/api/sessions/not-a-uuid", address))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 400);
}

#[tokio::test]
async fn finished_sessions_are_evicted_after_retention() {
    let mut config = test_config();
    config.session_retention_secs = 0;
    let address = spawn_app_with(config).await;
    let client = reqwest::Client::new();
    let token = creator_token(&client, &address).await;
    let code = create_quiz(&client, &address, &token, &quiz_draft(60)).await;

    let finished = join(&client, &address, &code, "Asha").await;
    let running = join(&client, &address, &code, "Ravi").await;

    let submit = client
        .post(format!("{}/api/sessions/{}/submit", address, finished))
        .json(&json!({ "confirmed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status().as_u16(), 200);

    let mut evicted = false;
    for _ in 0..100 {
        let response = client
            .get(format!("{}/api/sessions/{}", address, finished))
            .send()
            .await
            .unwrap();
        if response.status().as_u16() == 404 {
            evicted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(evicted, "finished session was never evicted");

    // Running attempts are never swept.
    let still_running = client
        .get(format!("{}/api/sessions/{}", address, running))
        .send()
        .await
        .unwrap();
    assert_eq!(still_running.status().as_u16(), 200);

    // The recorded result outlives the in-memory session.
    let board: Vec<Value> = client
        .get(format!("{}/api/quizzes/{}/leaderboard", address, code))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["name"], "Asha");
}
