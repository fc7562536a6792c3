use actix_web::{get, web, HttpRequest, Responder};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check_auth)
        .service(oauth_login)
        .service(oauth_callback);
}

#[get("/check_auth")]
async fn check_auth(data: web::Data<AppState>) -> impl Responder {
    crate::handlers::oauth_handler::check_auth(data).await
}

#[get("/oauth/login")]
async fn oauth_login() -> impl Responder {
    crate::handlers::oauth_handler::oauth_login().await
}

#[get("/oauth/callback")]
async fn oauth_callback(req: HttpRequest) -> impl Responder {
    crate::handlers::oauth_handler::oauth_callback(req).await
}
