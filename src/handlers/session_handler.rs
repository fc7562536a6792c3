use actix_session::Session;
use actix_web::web;
use log::{error, info, warn};
use serde_json::{json, Value};
use crate::global_session_manager::SharedSession;
use crate::routes::app_state::AppState;

/// Reuses the cookie's session when the server still knows it, otherwise
/// creates a new one and stores its id in the cookie.
pub async fn initialize_session(data: web::Data<AppState>, session: Session) -> Value {
    if let Ok(Some(existing)) = session.get::<String>("session_id") {
        if data.session_manager.get(&existing).is_some() {
            info!("Reusing session {}", existing);
            return json!({ "initialized": true, "session_id": existing });
        }
    }

    let session_id = data.session_manager.create();
    if let Err(e) = session.insert("session_id", session_id.clone()) {
        error!("Failed to insert session_id into cookie: {:?}", e);
    } else {
        info!("Stored session_id {} in cookie", session_id);
    }
    json!({ "initialized": true, "session_id": session_id })
}

/// Session id from the cookie, falling back to `session_id` in the body.
pub fn lookup_session(data: &AppState, session: &Session, body: &Value) -> Option<(String, SharedSession)> {
    let session_id = match session.get::<String>("session_id") {
        Ok(Some(id)) => id,
        _ => {
            warn!("No valid session_id found in cookie; falling back to request body");
            body["session_id"].as_str().unwrap_or_default().to_string()
        }
    };
    let state = data.session_manager.get(&session_id)?;
    Some((session_id, state))
}
