use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{error, info};
use serde_json::{json, Value};
use crate::handlers::session_handler::lookup_session;
use crate::routes::app_state::AppState;

/// Toggles `talking_mode` and `continuous_listening`; absent fields are left alone.
pub async fn update_settings(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<Value>,
) -> HttpResponse {
    let Some((session_id, state)) = lookup_session(&data, &session, &req_body) else {
        error!("Settings update for an unknown session");
        return HttpResponse::InternalServerError().json(json!({"error": "Session not initialized"}));
    };

    let mut user_session = state.lock().await;
    if let Some(talking) = req_body["talking_mode"].as_bool() {
        user_session.talking_mode = talking;
    }
    if let Some(continuous) = req_body["continuous_listening"].as_bool() {
        user_session.continuous_listening = continuous;
    }
    info!(
        "Session {} settings: talking_mode={}, continuous_listening={}",
        session_id, user_session.talking_mode, user_session.continuous_listening
    );
    HttpResponse::Ok().json(json!({
        "talking_mode": user_session.talking_mode,
        "continuous_listening": user_session.continuous_listening,
    }))
}
