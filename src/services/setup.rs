use std::path::Path;
use std::sync::Arc;
use log::{info, warn};
use crate::config;
use crate::services::chat_service::{create_ollama, ConversationDispatcher, DirectChat, ThinkingChat};
use crate::services::command_router::CommandRouter;
use crate::services::gmail_service::GmailService;
use crate::services::mail_adapter::MailAdapter;
use crate::services::mail_backend::{MailBackend, MailProviders};
use crate::services::outlook_service::OutlookService;
use crate::services::speech::SpeechOutput;
use crate::services::transcript_log::TranscriptLog;

/// Gmail counts as configured once a client secret or a token cache exists.
/// Outlook needs its client and tenant ids.
pub fn build_providers() -> MailProviders {
    let gmail_present = Path::new(&config::gmail_client_secret_path()).exists()
        || Path::new(&config::gmail_token_cache()).exists();
    let gmail: Option<Arc<dyn MailBackend>> = if gmail_present {
        match GmailService::from_config() {
            Ok(service) => Some(Arc::new(service)),
            Err(e) => {
                warn!("Gmail backend unavailable: {}", e);
                None
            }
        }
    } else {
        info!("No Gmail credentials found; Gmail is not configured");
        None
    };

    let outlook: Option<Arc<dyn MailBackend>> = match OutlookService::from_config() {
        Some(Ok(service)) => Some(Arc::new(service)),
        Some(Err(e)) => {
            warn!("Outlook backend unavailable: {}", e);
            None
        }
        None => {
            info!("OUTLOOK_CLIENT_ID/OUTLOOK_TENANT_ID not set; Outlook is not configured");
            None
        }
    };

    MailProviders { gmail, outlook }
}

pub fn build_transcript_log() -> Option<Arc<TranscriptLog>> {
    if config::transcript_logging_enabled() {
        Some(Arc::new(TranscriptLog::new(config::log_file_path())))
    } else {
        None
    }
}

/// Wires backends, both chat strategies and the transcript into a router.
pub fn build_router(speaker: Arc<dyn SpeechOutput>) -> CommandRouter {
    let transcript = build_transcript_log();
    let ollama = create_ollama();
    let thinking = Arc::new(ThinkingChat::new(
        ollama.clone(),
        config::thinking_model(),
        config::PLANNER_PROMPT,
    ));
    let direct = Arc::new(DirectChat::new(ollama, config::direct_model()));
    let voice = config::tts_voice();

    let dispatcher = ConversationDispatcher::new(
        thinking,
        direct,
        Arc::clone(&speaker),
        voice.clone(),
        transcript.clone(),
    );
    CommandRouter::new(
        MailAdapter::new(build_providers()),
        dispatcher,
        speaker,
        voice,
        transcript,
    )
}
