use std::fmt;
use std::sync::Arc;
use log::{error, info, warn};
use crate::config::DEFAULT_UNREAD_COUNT;
use crate::models::email::{format_listing, number_headers, EmailSummary};
use crate::models::session_state::{Provider, SessionState};
use crate::services::mail_backend::{MailBackend, MailError, MailProviders};

pub const NO_PROVIDER_MESSAGE: &str =
    "No email service is connected. Please connect to Gmail or Outlook first.";
pub const NOTHING_LISTED_MESSAGE: &str =
    "You haven't listed any emails yet. Try asking to fetch unread emails first.";
pub const NO_OPEN_EMAIL_MESSAGE: &str =
    "You haven't selected an email to reply to. Please read an email first.";
pub const EMPTY_REPLY_MESSAGE: &str =
    "The reply message seems to be empty. Please provide your reply.";
pub const NO_UNREAD_MESSAGE: &str = "You have no unread emails.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwitchError {
    #[error("{0} is not configured. Please set up your {0} credentials first.")]
    ProviderNotConfigured(Provider),

    #[error("Please connect to {0} first by saying 'connect to {0}'.")]
    NotConnected(Provider),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    List,
    Read,
    Reply,
    MarkRead,
    MarkUnread,
}

impl Operation {
    fn gerund(&self) -> &'static str {
        match self {
            Operation::List => "fetching your unread emails",
            Operation::Read => "reading the email",
            Operation::Reply => "sending your reply",
            Operation::MarkRead => "marking the email as read",
            Operation::MarkUnread => "marking the email as unread",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gerund())
    }
}

/// Turns a backend failure into the provider-named sentence the user hears.
fn failure_message(provider: Provider, operation: Operation, err: &MailError) -> String {
    match err {
        MailError::Auth(_) if operation == Operation::List => format!(
            "There's an issue with {p} authentication. Please try reconnecting to {p}.",
            p = provider
        ),
        MailError::Auth(_) => format!(
            "There's an issue with {p} authentication while {op}. Please try reconnecting to {p}.",
            p = provider,
            op = operation
        ),
        MailError::NotAuthenticated => format!(
            "You're not signed in to {p}. Please connect to {p} first.",
            p = provider
        ),
        MailError::Permission(_) => format!(
            "I don't have the necessary permissions for that {} action. You might need to re-authenticate with updated permissions.",
            provider
        ),
        MailError::NotFound(_) => format!(
            "Sorry, I could not find that email in {} while {}.",
            provider, operation
        ),
        MailError::Api { status, .. } => format!(
            "A {} API error occurred while {}: {}. Please try again later.",
            provider, operation, status
        ),
        MailError::Transport(details) | MailError::Unexpected(details) => format!(
            "Sorry, an unexpected error occurred while {}. Details: {}",
            operation, details
        ),
    }
}

/// One interface over whichever backend the session has selected. Every
/// operation returns the sentence to show or speak; backend errors stop here.
#[derive(Clone)]
pub struct MailAdapter {
    providers: MailProviders,
}

impl MailAdapter {
    pub fn new(providers: MailProviders) -> Self {
        MailAdapter { providers }
    }

    pub fn backend(&self, provider: Provider) -> Option<&Arc<dyn MailBackend>> {
        self.providers.get(provider)
    }

    fn active<'a>(&'a self, session: &SessionState) -> Option<(Provider, &'a Arc<dyn MailBackend>)> {
        let provider = session.active_provider?;
        self.providers.get(provider).map(|backend| (provider, backend))
    }

    /// Switches the active provider and drops listing and open email.
    /// Outlook additionally needs a completed sign-in.
    pub fn set_active(&self, session: &mut SessionState, provider: Provider) -> Result<String, SwitchError> {
        let backend = self
            .providers
            .get(provider)
            .ok_or(SwitchError::ProviderNotConfigured(provider))?;
        if provider == Provider::Outlook && !backend.is_authenticated() {
            return Err(SwitchError::NotConnected(provider));
        }
        session.switch_provider(provider);
        info!("Active mail provider is now {}", provider);
        Ok(format!(
            "Switched to {}. You can ask me to check your unread emails.",
            provider
        ))
    }

    pub async fn list_unread(&self, session: &mut SessionState, max_results: u32) -> String {
        let Some((provider, backend)) = self.active(session) else {
            return NO_PROVIDER_MESSAGE.to_string();
        };
        let max_results = if max_results == 0 { DEFAULT_UNREAD_COUNT } else { max_results };
        info!("Listing up to {} unread emails from {}", max_results, provider);

        match backend.list_unread(max_results).await {
            Ok(headers) if headers.is_empty() => {
                session.replace_listing(Vec::new());
                NO_UNREAD_MESSAGE.to_string()
            }
            Ok(headers) => {
                let listing = number_headers(headers);
                let response = format!(
                    "I found {} unread emails. Here are the latest ones: {}",
                    listing.len(),
                    format_listing(&listing)
                );
                session.replace_listing(listing);
                response
            }
            Err(e) => {
                error!("{} list_unread failed: {}", provider, e);
                failure_message(provider, Operation::List, &e)
            }
        }
    }

    fn resolve(session: &SessionState, identifier: &str) -> Result<EmailSummary, String> {
        if session.listed_emails.is_empty() {
            return Err(NOTHING_LISTED_MESSAGE.to_string());
        }
        session.resolve(identifier).cloned().ok_or_else(|| {
            format!(
                "Sorry, I couldn't find an email matching '{}'. Please try a number from the list or a more specific name or subject.",
                identifier
            )
        })
    }

    pub async fn read(&self, session: &mut SessionState, identifier: &str) -> String {
        let Some((provider, backend)) = self.active(session) else {
            return NO_PROVIDER_MESSAGE.to_string();
        };
        let target = match Self::resolve(session, identifier) {
            Ok(target) => target,
            Err(message) => return message,
        };
        let backend = Arc::clone(backend);

        match backend.read(&target.id).await {
            Ok(Some(mut detail)) => {
                match backend.mark_read(&target.id).await {
                    Ok(true) => {}
                    Ok(false) => warn!("{} did not mark {} as read", provider, target.id),
                    Err(e) => warn!("{} mark_read for {} failed: {}", provider, target.id, e),
                }
                detail.id = target.id;
                let response = detail.to_string();
                session.open_email = Some(detail);
                response
            }
            Ok(None) => format!(
                "Sorry, I could not read the content for email from {} with subject {}.",
                target.from, target.subject
            ),
            Err(e) => {
                error!("{} read of {} failed: {}", provider, target.id, e);
                failure_message(provider, Operation::Read, &e)
            }
        }
    }

    pub async fn reply(&self, session: &mut SessionState, body: &str) -> String {
        let Some((provider, backend)) = self.active(session) else {
            return NO_PROVIDER_MESSAGE.to_string();
        };
        let Some(open) = session.open_email.as_ref() else {
            return NO_OPEN_EMAIL_MESSAGE.to_string();
        };
        if body.trim().is_empty() {
            return EMPTY_REPLY_MESSAGE.to_string();
        }

        match backend.reply(&open.id, body).await {
            Ok(true) => format!(
                "Okay, I've sent your reply to {} with subject {}.",
                open.sender, open.subject
            ),
            Ok(false) => "Sorry, I couldn't send your reply. Please try again.".to_string(),
            Err(e) => {
                error!("{} reply to {} failed: {}", provider, open.id, e);
                failure_message(provider, Operation::Reply, &e)
            }
        }
    }

    pub async fn mark_read(&self, session: &mut SessionState, identifier: &str) -> String {
        self.mark(session, identifier, Operation::MarkRead).await
    }

    pub async fn mark_unread(&self, session: &mut SessionState, identifier: &str) -> String {
        self.mark(session, identifier, Operation::MarkUnread).await
    }

    async fn mark(&self, session: &mut SessionState, identifier: &str, operation: Operation) -> String {
        let Some((provider, backend)) = self.active(session) else {
            return NO_PROVIDER_MESSAGE.to_string();
        };
        let target = match Self::resolve(session, identifier) {
            Ok(target) => target,
            Err(message) => return message,
        };
        let (result, state) = match operation {
            Operation::MarkUnread => (backend.mark_unread(&target.id).await, "unread"),
            _ => (backend.mark_read(&target.id).await, "read"),
        };

        match result {
            Ok(true) => format!(
                "Marked the email '{}' as {} in {}.",
                target.subject, state, provider
            ),
            Ok(false) => format!(
                "Sorry, I couldn't mark the email '{}' as {} in {}.",
                target.subject, state, provider
            ),
            Err(e) => {
                error!("{} mark {} for {} failed: {}", provider, state, target.id, e);
                failure_message(provider, operation, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_name_the_provider() {
        let auth = failure_message(Provider::Outlook, Operation::List, &MailError::Auth("expired".into()));
        assert_eq!(
            auth,
            "There's an issue with Outlook authentication. Please try reconnecting to Outlook."
        );
        let perm = failure_message(Provider::Gmail, Operation::Reply, &MailError::Permission("scope".into()));
        assert!(perm.contains("Gmail"));
        assert!(perm.contains("permissions"));
        let api = failure_message(
            Provider::Gmail,
            Operation::Read,
            &MailError::Api { status: 500, message: "boom".into() },
        );
        assert_eq!(
            api,
            "A Gmail API error occurred while reading the email: 500. Please try again later."
        );
        let other = failure_message(Provider::Gmail, Operation::List, &MailError::Unexpected("boom".into()));
        assert_eq!(
            other,
            "Sorry, an unexpected error occurred while fetching your unread emails. Details: boom"
        );
    }
}
