use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{error, info};
use serde_json::{json, Value};
use crate::handlers::session_handler::lookup_session;
use crate::models::session_state::Modality;
use crate::routes::app_state::AppState;

/// Routes one utterance for the caller's session. `voice: true` marks it as
/// captured speech, which changes reply-body waits and continuous listening.
pub async fn handle_command(
    data: web::Data<AppState>,
    session: Session,
    req_body: web::Json<Value>,
) -> HttpResponse {
    let Some((session_id, state)) = lookup_session(&data, &session, &req_body) else {
        error!("Command for an unknown session");
        return HttpResponse::InternalServerError().json(json!({"error": "Session not initialized"}));
    };

    let message = req_body["message"].as_str().unwrap_or_default();
    let modality = if req_body["voice"].as_bool().unwrap_or(false) {
        Modality::Voice
    } else {
        Modality::Text
    };
    info!("Processing {:?} message for session {}: {}", modality, session_id, message);

    let mut user_session = state.lock().await;
    let outcome = data.router.handle(message, modality, &mut user_session).await;
    HttpResponse::Ok().json(json!({
        "response": outcome.response,
        "spoken": outcome.spoken,
        "relisten": outcome.relisten,
    }))
}
