use std::sync::Arc;
use dual_brain::config;
use dual_brain::models::session_state::SessionState;
use dual_brain::services::setup;
use dual_brain::services::speech::{ConsoleListener, ConsoleSpeaker};
use dual_brain::services::voice_loop::VoiceLoop;

/// Terminal stand-in for a microphone and speaker: each stdin line is one
/// captured utterance and an empty line is silence.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    config::init_logging();

    let router = Arc::new(setup::build_router(Arc::new(ConsoleSpeaker)));
    let listener = Arc::new(ConsoleListener::new());
    let voice_loop = VoiceLoop::new(router, listener.clone());
    let mut session = SessionState::new();
    session.continuous_listening = true;

    println!("Say 'switch to gmail' to begin. Ctrl-D quits.");
    while !listener.is_closed() {
        let outcomes = voice_loop.listen_again(&mut session, None).await;
        if outcomes.is_empty() {
            log::debug!("Nothing heard");
        }
    }
}
