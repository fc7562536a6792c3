use std::sync::Arc;
use actix_files::Files;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dual_brain::config;
use dual_brain::global_session_manager::GlobalSessionManager;
use dual_brain::routes::app_state::AppState;
use dual_brain::routes::{command_routes, oauth_routes, session_routes};
use dual_brain::services::setup;
use dual_brain::services::speech::SilentSpeaker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    config::init_logging();

    // The browser does its own synthesis from the returned text.
    let router = Arc::new(setup::build_router(Arc::new(SilentSpeaker)));
    let state = AppState {
        router,
        session_manager: GlobalSessionManager::new(),
    };
    let secret_key = Key::generate();
    let port = config::server_port();

    log::info!("Starting server on http://127.0.0.1:{}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(session_routes::init_routes)
            .configure(command_routes::init_routes)
            .configure(oauth_routes::init_routes)
            // Serve static files (including index.html) from the "./static" directory.
            .service(Files::new("/", "./static").index_file("index.html"))
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
