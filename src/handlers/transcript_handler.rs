use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde_json::json;
use crate::routes::app_state::AppState;

pub const TRANSCRIPT_FILENAME: &str = "chat_history.json";

/// Serves the recorded turns as a JSON attachment for "Download Chat History".
pub async fn download_transcript(data: web::Data<AppState>) -> HttpResponse {
    let Some(log) = data.router.transcript() else {
        warn!("Transcript requested while logging is disabled");
        return HttpResponse::NotFound().json(json!({"error": "Transcript logging is disabled"}));
    };
    let entries = log.load();
    info!("Serving {} transcript turns from {}", entries.len(), log.path().display());
    HttpResponse::Ok()
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(TRANSCRIPT_FILENAME.to_string())],
        })
        .json(entries)
}
