use actix_session::Session;
use actix_web::{get, post, web, Responder};
use serde_json::Value;
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(command).service(settings).service(transcript);
}

#[post("/command")]
async fn command(data: web::Data<AppState>, session: Session, req_body: web::Json<Value>) -> impl Responder {
    crate::handlers::command_handler::handle_command(data, session, req_body).await
}

#[post("/settings")]
async fn settings(data: web::Data<AppState>, session: Session, req_body: web::Json<Value>) -> impl Responder {
    crate::handlers::settings_handler::update_settings(data, session, req_body).await
}

#[get("/transcript")]
async fn transcript(data: web::Data<AppState>) -> impl Responder {
    crate::handlers::transcript_handler::download_transcript(data).await
}
