use std::fmt;
use ollama_rs::generation::chat::ChatMessage;
use serde::{Deserialize, Serialize};
use crate::models::email::{EmailDetail, EmailSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Gmail,
    Outlook,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gmail => write!(f, "Gmail"),
            Provider::Outlook => write!(f, "Outlook"),
        }
    }
}

/// Where an utterance came from. Reply-body waits are tracked per modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Voice,
    Text,
}

/// Mutable per-user context threaded through every turn.
#[derive(Clone, Default)]
pub struct SessionState {
    pub active_provider: Option<Provider>,
    pub listed_emails: Vec<EmailSummary>,
    pub open_email: Option<EmailDetail>,
    pub awaiting_voice_reply: bool,
    pub awaiting_text_reply: bool,
    pub continuous_listening: bool,
    pub talking_mode: bool,
    /// Provider whose sign-in was started but has not completed yet.
    pub auth_pending: Option<Provider>,
    /// Text of the turn currently being handed to the chat strategies.
    pub pending_input: String,
    pub thinking_history: Vec<ChatMessage>,
    pub thinking_plans: Vec<String>,
    pub direct_history: Vec<ChatMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to defaults, chat histories included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn awaiting_reply_body(&self, modality: Modality) -> bool {
        match modality {
            Modality::Voice => self.awaiting_voice_reply,
            Modality::Text => self.awaiting_text_reply,
        }
    }

    pub fn set_awaiting_reply_body(&mut self, modality: Modality, waiting: bool) {
        match modality {
            Modality::Voice => self.awaiting_voice_reply = waiting,
            Modality::Text => self.awaiting_text_reply = waiting,
        }
    }

    /// Identifiers from different providers are never valid together.
    pub fn switch_provider(&mut self, provider: Provider) {
        self.active_provider = Some(provider);
        self.auth_pending = None;
        self.clear_mail_context();
    }

    pub fn clear_mail_context(&mut self) {
        self.listed_emails.clear();
        self.open_email = None;
        self.awaiting_voice_reply = false;
        self.awaiting_text_reply = false;
    }

    /// Replaces the listing wholesale; entries from earlier fetches are dropped.
    pub fn replace_listing(&mut self, listing: Vec<EmailSummary>) {
        self.listed_emails = listing;
    }

    /// First listed email matching `identifier`: by ordinal when it parses as an
    /// integer, otherwise by case-insensitive subject/sender substring.
    pub fn resolve(&self, identifier: &str) -> Option<&EmailSummary> {
        let identifier = identifier.trim();
        if let Ok(ordinal) = identifier.parse::<usize>() {
            return self.listed_emails.iter().find(|e| e.ordinal == ordinal);
        }
        let needle = identifier.to_lowercase();
        self.listed_emails.iter().find(|e| e.matches(&needle))
    }
}
