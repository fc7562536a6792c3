use std::env;
use std::time::Duration;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const DEFAULT_THINKING_MODEL: &str = "llama3.2";
pub const DEFAULT_DIRECT_MODEL: &str = "llama3.2";
pub const PLANNER_PROMPT: &str = "You are a careful planner. Before anyone answers the user, \
write a short numbered plan describing how a helpful assistant should approach the request: \
what the user is really asking, which facts matter, and how the answer should be structured. \
Do not answer the request itself.";

/// Unread listing size when the utterance names no count.
pub const DEFAULT_UNREAD_COUNT: u32 = 5;

/// Consecutive empty listens tolerated before the auto-listen loop stops re-arming.
pub const MAX_SILENT_RELISTENS: u32 = 3;

/// Sessions untouched for this long are dropped the next time one is created.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const OUTLOOK_SCOPES: [&str; 3] = ["Mail.ReadWrite", "Mail.Send", "offline_access"];

const OLLAMA_PORT: u16 = 11434;
const OLLAMA_HOST: &str = "localhost";
const SERVER_PORT: u16 = 8080;
const GMAIL_CLIENT_SECRET_PATH: &str = "./cfg/client_secret.json";
const GMAIL_TOKEN_CACHE: &str = "tokencache.json";
const LOG_FILE_PATH: &str = "logs/chat_history.json";
const TTS_VOICE: &str = "alloy";

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn ollama_host() -> String {
    let host = env_or("OLLAMA_HOST", OLLAMA_HOST);
    if host.starts_with("http://") || host.starts_with("https://") {
        host
    } else {
        String::from("http://".to_owned() + &host)
    }
}

pub fn ollama_port() -> u16 {
    env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(OLLAMA_PORT)
}

pub fn thinking_model() -> String {
    env_or("THINKING_MODEL", DEFAULT_THINKING_MODEL)
}

pub fn direct_model() -> String {
    env_or("DIRECT_MODEL", DEFAULT_DIRECT_MODEL)
}

pub fn server_port() -> u16 {
    env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(SERVER_PORT)
}

pub fn gmail_client_secret_path() -> String {
    env_or("GMAIL_CLIENT_SECRET_PATH", GMAIL_CLIENT_SECRET_PATH)
}

pub fn gmail_token_cache() -> String {
    env_or("GMAIL_TOKEN_CACHE", GMAIL_TOKEN_CACHE)
}

pub fn gmail_redirect_url() -> String {
    format!("http://localhost:{}/oauth/callback", server_port())
}

pub fn outlook_client_id() -> Option<String> {
    env::var("OUTLOOK_CLIENT_ID").ok().filter(|v| !v.trim().is_empty())
}

pub fn outlook_tenant_id() -> Option<String> {
    env::var("OUTLOOK_TENANT_ID").ok().filter(|v| !v.trim().is_empty())
}

pub fn transcript_logging_enabled() -> bool {
    env_or("ENABLE_LOGGING", "true").eq_ignore_ascii_case("true")
}

pub fn log_file_path() -> String {
    env_or("LOG_FILE_PATH", LOG_FILE_PATH)
}

pub fn tts_voice() -> String {
    env_or("TTS_VOICE", TTS_VOICE)
}
