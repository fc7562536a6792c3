use std::sync::Arc;
use async_trait::async_trait;
use crate::models::email::{EmailDetail, MailHeader};
use crate::models::session_state::Provider;

/// Closed set of failure kinds a backend call can end in. Raw HTTP and SDK
/// failures are converted into one of these right after the call returns.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Permission error: {0}")]
    Permission(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    Unexpected(String),
}

impl MailError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => MailError::Auth(message),
            403 => MailError::Permission(message),
            404 => MailError::NotFound(message),
            _ => MailError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for MailError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => MailError::from_status(status.as_u16(), error.to_string()),
            None if error.is_decode() => MailError::Unexpected(error.to_string()),
            None => MailError::Transport(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for MailError {
    fn from(error: serde_json::Error) -> Self {
        MailError::Unexpected(error.to_string())
    }
}

impl From<std::io::Error> for MailError {
    fn from(error: std::io::Error) -> Self {
        MailError::Unexpected(error.to_string())
    }
}

/// Uniform capability set every mail provider implements.
#[async_trait]
pub trait MailBackend: Send + Sync {
    fn provider(&self) -> Provider;

    /// Whether a usable token is available right now.
    fn is_authenticated(&self) -> bool;

    /// Whether a sign-in started by `begin_authentication` is still waiting
    /// on the user.
    fn auth_in_progress(&self) -> bool;

    /// Starts sign-in. Returns user instructions when the user has to act,
    /// `None` when already signed in.
    async fn begin_authentication(&self) -> Result<Option<String>, MailError>;

    async fn list_unread(&self, max_results: u32) -> Result<Vec<MailHeader>, MailError>;

    /// `Ok(None)` when the message exists in the listing but its content could not be read.
    async fn read(&self, id: &str) -> Result<Option<EmailDetail>, MailError>;

    async fn reply(&self, id: &str, text: &str) -> Result<bool, MailError>;

    async fn mark_read(&self, id: &str) -> Result<bool, MailError>;

    async fn mark_unread(&self, id: &str) -> Result<bool, MailError>;
}

/// The configured backends, keyed by provider tag.
#[derive(Clone, Default)]
pub struct MailProviders {
    pub gmail: Option<Arc<dyn MailBackend>>,
    pub outlook: Option<Arc<dyn MailBackend>>,
}

impl MailProviders {
    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn MailBackend>> {
        match provider {
            Provider::Gmail => self.gmail.as_ref(),
            Provider::Outlook => self.outlook.as_ref(),
        }
    }
}
