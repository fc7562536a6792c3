mod common;

use std::sync::Arc;
use actix_web::{http::header, http::StatusCode, test, web, App};
use serde_json::Value;
use dual_brain::global_session_manager::GlobalSessionManager;
use dual_brain::models::session_state::{Modality, SessionState};
use dual_brain::routes::app_state::AppState;
use dual_brain::routes::command_routes;
use dual_brain::services::transcript_log::TranscriptLog;
use common::{harness, harness_with_transcript, Harness};

fn app_state(h: &Harness) -> AppState {
    AppState {
        router: Arc::clone(&h.router),
        session_manager: GlobalSessionManager::new(),
    }
}

#[actix_web::test]
async fn transcript_download_returns_logged_turns() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(TranscriptLog::new(dir.path().join("chat_history.json")));
    let h = harness_with_transcript(None, None, Some(log));
    let mut session = SessionState::new();
    h.router.handle("tell me a joke", Modality::Text, &mut session).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&h)))
            .configure(command_routes::init_routes),
    )
    .await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/transcript").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("chat_history.json"));

    let body: Value = test::read_body_json(resp).await;
    let turns = body.as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["user_input"], "tell me a joke");
    assert_eq!(turns[0]["direct_response"], "direct answer to tell me a joke");
}

#[actix_web::test]
async fn transcript_download_without_logging_is_not_found() {
    let h = harness(None, None);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&h)))
            .configure(command_routes::init_routes),
    )
    .await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/transcript").to_request()).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Transcript logging is disabled");
}
