use std::sync::Arc;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use ollama_rs::generation::chat::ChatMessage;
use regex::Regex;
use crate::config::DEFAULT_UNREAD_COUNT;
use crate::models::session_state::{Modality, Provider, SessionState};
use crate::models::transcript::TranscriptEntry;
use crate::services::chat_service::ConversationDispatcher;
use crate::services::mail_adapter::{MailAdapter, SwitchError};
use crate::services::numerals;
use crate::services::speech::SpeechOutput;
use crate::services::transcript_log::TranscriptLog;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[a-z0-9']+").expect("word pattern is valid");
}

pub const READ_FIRST_MESSAGE: &str = "Please read an email first before replying.";
pub const READ_FIRST_TEXT_MESSAGE: &str = "Please read an email first before replying via text.";
pub const WHICH_EMAIL_TO_READ_MESSAGE: &str =
    "Please specify which email to read, for example, 'read email number one' or 'read email from Jane'.";
pub const CONNECT_FIRST_MESSAGE: &str =
    "To use email commands, please first connect an email service by saying 'switch to gmail' or 'switch to outlook'.";
pub const STOPPED_LISTENING_MESSAGE: &str = "Okay, I've stopped continuous listening.";
pub const STARTED_LISTENING_MESSAGE: &str =
    "Continuous listening is on. Say 'stop listening' to turn it off.";
pub const CLEARED_MESSAGE: &str = "I've cleared our conversation and email context.";
pub const NOT_HEARD_MESSAGE: &str = "I didn't catch that. Could you say it again?";

const STOP_LISTENING_PHRASES: &[&str] = &[
    "stop listening",
    "exit continuous mode",
    "stop continuous listening",
    "disable continuous listening",
    "turn off continuous listening",
];
const START_LISTENING_PHRASES: &[&str] = &[
    "start listening",
    "start continuous listening",
    "continuous mode on",
    "keep listening",
    "enable continuous listening",
];
const SWITCH_GMAIL_PHRASES: &[&str] = &["switch to gmail", "use gmail"];
const SWITCH_OUTLOOK_PHRASES: &[&str] = &["switch to outlook", "use outlook"];
const CONNECT_GMAIL_PHRASES: &[&str] = &["connect to gmail", "connect gmail", "sign in to gmail"];
const CONNECT_OUTLOOK_PHRASES: &[&str] = &["connect to outlook", "connect outlook", "sign in to outlook"];
const CLEAR_PHRASES: &[&str] = &["clear chats", "clear chat", "clear session", "clear history"];

const FETCH_PHRASES: &[&str] = &[
    "read my unread email",
    "fetch unread email",
    "check my email",
    "get my unread email",
    "get my last email",
    "check my inbox",
];
const FETCH_VERBS: &[&str] = &["fetch", "check", "get", "show", "list"];
const MAIL_NOUNS: &[&str] = &["email", "emails", "mail", "inbox", "messages"];
const COMMAND_LEAD_IN: &[&str] = &[
    "please", "can", "could", "would", "will", "you", "now", "and", "then", "ok", "okay", "hey", "just",
];
const READ_PHRASES: &[&str] = &["read email", "open email"];
const READ_VERBS: &[&str] = &["read", "open"];
const REPLY_PHRASES: &[&str] = &[
    "reply to this email",
    "reply email",
    "reply to email",
    "reply to the email",
    "reply to that email",
];
const MARK_UNREAD_PHRASES: &[&str] = &["mark as unread", "mark it as unread", "mark unread"];
const MARK_READ_PHRASES: &[&str] = &["mark as read", "mark it as read", "mark read"];
const MAIL_KEYWORDS: &[&str] = &[
    "email", "emails", "mail", "inbox", "unread", "reply", "gmail", "outlook",
];

const LEADING_FILLER: &[&str] = &["the", "number", "email", "message", "with", "my", "that", "this"];
const TRAILING_FILLER: &[&str] = &["email", "emails", "message", "please"];

struct Token {
    text: String,
    start: usize,
    end: usize,
}

/// An utterance split into lower-cased word tokens that keep their byte
/// offsets into the original text, so extracted spans preserve casing.
pub struct Utterance<'a> {
    original: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Utterance<'a> {
    pub fn new(original: &'a str) -> Self {
        // ASCII lower-casing keeps byte offsets aligned with `original`.
        let lower = original.to_ascii_lowercase();
        let tokens = WORD
            .find_iter(&lower)
            .map(|m| Token {
                text: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect();
        Utterance { original, tokens }
    }

    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    fn has_token(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t.text == word)
    }

    fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_token(w))
    }

    /// Index of the last token of the first occurrence of `phrase`.
    fn find_phrase(&self, phrase: &str) -> Option<usize> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.is_empty() || words.len() > self.tokens.len() {
            return None;
        }
        self.tokens
            .windows(words.len())
            .position(|window| window.iter().zip(&words).all(|(t, w)| t.text == *w))
            .map(|start| start + words.len() - 1)
    }

    /// Checks phrases in list order; the first one present wins.
    fn find_any_phrase(&self, phrases: &[&str]) -> Option<usize> {
        phrases.iter().find_map(|p| self.find_phrase(p))
    }

    fn matches_any(&self, phrases: &[&str]) -> bool {
        self.find_any_phrase(phrases).is_some()
    }

    fn text_after(&self, token_index: usize) -> &'a str {
        self.original[self.tokens[token_index].end..]
            .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == ',')
            .trim_end()
    }
}

/// A recognised mail command with its extracted parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum MailIntent {
    FetchUnread { count: u32 },
    Read { identifier: Option<String> },
    BeginReply,
    MarkRead { identifier: Option<String> },
    MarkUnread { identifier: Option<String> },
}

struct IntentRule {
    name: &'static str,
    matches: fn(&Utterance<'_>) -> bool,
    extract: fn(&Utterance<'_>) -> MailIntent,
}

// Mark rules come first: "mark as unread email 2" also satisfies the fetch
// predicate, and "mark as read" contains the read verb. An explicit
// "read email" phrase beats fetch so the identifier span may hold any words.
const MAIL_RULES: &[IntentRule] = &[
    IntentRule { name: "mark_unread", matches: is_mark_unread, extract: extract_mark_unread },
    IntentRule { name: "mark_read", matches: is_mark_read, extract: extract_mark_read },
    IntentRule { name: "read_phrase", matches: has_read_phrase, extract: extract_read },
    IntentRule { name: "fetch_unread", matches: is_fetch, extract: extract_fetch },
    IntentRule { name: "read", matches: is_read, extract: extract_read },
    IntentRule { name: "reply", matches: is_reply, extract: extract_reply },
];

fn is_mark_unread(u: &Utterance<'_>) -> bool {
    u.matches_any(MARK_UNREAD_PHRASES)
}

fn extract_mark_unread(u: &Utterance<'_>) -> MailIntent {
    let identifier = u
        .find_any_phrase(MARK_UNREAD_PHRASES)
        .and_then(|idx| extract_identifier(u.text_after(idx)));
    MailIntent::MarkUnread { identifier }
}

fn is_mark_read(u: &Utterance<'_>) -> bool {
    u.matches_any(MARK_READ_PHRASES)
}

fn extract_mark_read(u: &Utterance<'_>) -> MailIntent {
    let identifier = u
        .find_any_phrase(MARK_READ_PHRASES)
        .and_then(|idx| extract_identifier(u.text_after(idx)));
    MailIntent::MarkRead { identifier }
}

/// Index of the verb that opens the command, skipping polite lead-in words.
/// "can you show me my inbox" opens with "show"; "how do I get more email"
/// opens with "how".
fn command_verb(u: &Utterance<'_>, verbs: &[&str]) -> Option<usize> {
    u.tokens
        .iter()
        .position(|t| !COMMAND_LEAD_IN.contains(&t.text.as_str()))
        .filter(|&idx| verbs.contains(&u.tokens[idx].text.as_str()))
}

fn is_fetch(u: &Utterance<'_>) -> bool {
    if u.matches_any(FETCH_PHRASES) {
        return true;
    }
    let Some(verb) = command_verb(u, FETCH_VERBS).or_else(|| command_verb(u, &["read"])) else {
        return false;
    };
    let rest = &u.tokens[verb + 1..];
    let has_noun = rest.iter().any(|t| MAIL_NOUNS.contains(&t.text.as_str()));
    let has_unread = rest.iter().any(|t| t.text == "unread");
    has_unread || (has_noun && u.tokens[verb].text != "read")
}

fn extract_fetch(u: &Utterance<'_>) -> MailIntent {
    MailIntent::FetchUnread { count: extract_count(u) }
}

/// Index of a read/open verb followed somewhere later by a mail noun.
fn read_verb_index(u: &Utterance<'_>) -> Option<usize> {
    u.tokens.iter().position(|t| READ_VERBS.contains(&t.text.as_str())).filter(|&verb| {
        u.tokens[verb + 1..]
            .iter()
            .any(|t| matches!(t.text.as_str(), "email" | "emails" | "message"))
    })
}

fn has_read_phrase(u: &Utterance<'_>) -> bool {
    u.matches_any(READ_PHRASES)
}

fn is_read(u: &Utterance<'_>) -> bool {
    has_read_phrase(u) || read_verb_index(u).is_some()
}

fn extract_read(u: &Utterance<'_>) -> MailIntent {
    let span_start = u.find_any_phrase(READ_PHRASES).or_else(|| read_verb_index(u));
    let identifier = span_start.and_then(|idx| extract_identifier(u.text_after(idx)));
    MailIntent::Read { identifier }
}

fn is_reply(u: &Utterance<'_>) -> bool {
    u.matches_any(REPLY_PHRASES)
}

fn extract_reply(_: &Utterance<'_>) -> MailIntent {
    MailIntent::BeginReply
}

/// Result count for an unread fetch: the first bare number, else a number
/// directly before "email(s)", else any number word, else the default.
fn extract_count(u: &Utterance<'_>) -> u32 {
    let positive = |s: &str| s.parse::<u32>().ok().filter(|n| *n > 0);

    let bare = u
        .tokens
        .iter()
        .filter(|t| t.text.chars().all(|c| c.is_ascii_digit()))
        .find_map(|t| positive(&t.text));
    if let Some(count) = bare {
        return count;
    }

    let before_noun = u.tokens.windows(2).find_map(|pair| {
        if matches!(pair[1].text.as_str(), "email" | "emails") {
            numerals::token_digits(&pair[0].text).and_then(|d| positive(&d))
        } else {
            None
        }
    });
    if let Some(count) = before_noun {
        return count;
    }

    u.tokens
        .iter()
        .find_map(|t| numerals::normalize(&t.text))
        .and_then(positive)
        .unwrap_or(DEFAULT_UNREAD_COUNT)
}

/// Slice of `text` without leading/trailing filler words and punctuation.
fn strip_filler(text: &str) -> String {
    let u = Utterance::new(text);
    let first = u
        .tokens
        .iter()
        .position(|t| !LEADING_FILLER.contains(&t.text.as_str()));
    let last = u
        .tokens
        .iter()
        .rposition(|t| !TRAILING_FILLER.contains(&t.text.as_str()));
    match (first, last) {
        (Some(first), Some(last)) if first <= last => {
            text[u.tokens[first].start..u.tokens[last].end].to_string()
        }
        _ => String::new(),
    }
}

/// Which email a read/mark command refers to. A short number assembled from
/// digits and number words wins; then whatever follows "subject" or "from";
/// then the span itself.
fn extract_identifier(span: &str) -> Option<String> {
    let u = Utterance::new(span);
    let digits: String = u
        .tokens
        .iter()
        .filter_map(|t| numerals::token_digits(&t.text))
        .collect();
    if !digits.is_empty() && digits.len() < 3 {
        return Some(digits);
    }

    if let Some(idx) = u.tokens.iter().position(|t| t.text == "subject" || t.text == "from") {
        let rest = strip_filler(u.text_after(idx));
        if !rest.is_empty() {
            return Some(rest);
        }
    }

    let rest = strip_filler(span);
    (!rest.is_empty()).then_some(rest)
}

/// Mail intent of `input`, ignoring session state.
pub fn classify_mail_intent(input: &str) -> Option<MailIntent> {
    classify(&Utterance::new(input))
}

fn classify(u: &Utterance<'_>) -> Option<MailIntent> {
    MAIL_RULES.iter().find(|rule| (rule.matches)(u)).map(|rule| {
        debug!("Matched mail rule {}", rule.name);
        (rule.extract)(u)
    })
}

fn switch_target(u: &Utterance<'_>) -> Option<Provider> {
    if u.matches_any(SWITCH_GMAIL_PHRASES) {
        Some(Provider::Gmail)
    } else if u.matches_any(SWITCH_OUTLOOK_PHRASES) {
        Some(Provider::Outlook)
    } else {
        None
    }
}

fn connect_target(u: &Utterance<'_>) -> Option<Provider> {
    if u.matches_any(CONNECT_GMAIL_PHRASES) {
        Some(Provider::Gmail)
    } else if u.matches_any(CONNECT_OUTLOOK_PHRASES) {
        Some(Provider::Outlook)
    } else {
        None
    }
}

/// Which branch of the router produced a turn's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Listening,
    Provider,
    ReplyBody,
    Clear,
    Mail,
    Guidance,
    General,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: String,
    pub kind: TurnKind,
    pub spoken: bool,
    /// The caller should capture speech again right away.
    pub relisten: bool,
}

/// Decides what each utterance is and sends it to the mail adapter or the
/// conversation dispatcher. One utterance is routed to completion before the
/// next is accepted; all per-user state lives in the `SessionState` passed in.
pub struct CommandRouter {
    adapter: MailAdapter,
    dispatcher: ConversationDispatcher,
    speaker: Arc<dyn SpeechOutput>,
    voice: String,
    transcript: Option<Arc<TranscriptLog>>,
}

impl CommandRouter {
    pub fn new(
        adapter: MailAdapter,
        dispatcher: ConversationDispatcher,
        speaker: Arc<dyn SpeechOutput>,
        voice: impl Into<String>,
        transcript: Option<Arc<TranscriptLog>>,
    ) -> Self {
        CommandRouter {
            adapter,
            dispatcher,
            speaker,
            voice: voice.into(),
            transcript,
        }
    }

    pub fn adapter(&self) -> &MailAdapter {
        &self.adapter
    }

    pub fn transcript(&self) -> Option<&Arc<TranscriptLog>> {
        self.transcript.as_ref()
    }

    pub async fn handle(&self, input: &str, modality: Modality, session: &mut SessionState) -> TurnOutcome {
        self.settle_auth_pending(session);
        let utterance = Utterance::new(input);
        if utterance.is_blank() {
            return self.respond(session, modality, TurnKind::Empty, NOT_HEARD_MESSAGE.to_string()).await;
        }

        if modality == Modality::Voice {
            if session.continuous_listening && utterance.matches_any(STOP_LISTENING_PHRASES) {
                info!("Continuous listening disabled by voice command");
                session.continuous_listening = false;
                return self
                    .finish(session, modality, input, TurnKind::Listening, STOPPED_LISTENING_MESSAGE.to_string())
                    .await;
            }
        }

        if let Some(provider) = switch_target(&utterance) {
            let response = match self.adapter.set_active(session, provider) {
                Ok(confirmation) => confirmation,
                Err(e) => {
                    warn!("Switch to {} refused: {:?}", provider, e);
                    e.to_string()
                }
            };
            return self.finish(session, modality, input, TurnKind::Provider, response).await;
        }
        if session.awaiting_reply_body(modality) {
            // The wait ends with this utterance whatever the send outcome.
            session.set_awaiting_reply_body(modality, false);
            if session.open_email.is_some() {
                let response = self.adapter.reply(session, input.trim()).await;
                return self.finish(session, modality, input, TurnKind::ReplyBody, response).await;
            }
            warn!("Dropping stale reply wait: no open email");
        }

        if modality == Modality::Voice && utterance.matches_any(START_LISTENING_PHRASES) {
            info!("Continuous listening enabled by voice command");
            session.continuous_listening = true;
            return self
                .finish(session, modality, input, TurnKind::Listening, STARTED_LISTENING_MESSAGE.to_string())
                .await;
        }
        if let Some(provider) = connect_target(&utterance) {
            let response = self.connect(session, provider).await;
            return self.finish(session, modality, input, TurnKind::Provider, response).await;
        }

        if utterance.matches_any(CLEAR_PHRASES) {
            session.reset();
            self.dispatcher.clear(session);
            return self.finish(session, modality, input, TurnKind::Clear, CLEARED_MESSAGE.to_string()).await;
        }

        if session.active_provider.is_some() {
            if let Some(intent) = classify(&utterance) {
                let response = self.run_intent(session, modality, intent).await;
                return self.finish(session, modality, input, TurnKind::Mail, response).await;
            }
        } else if utterance.has_any(MAIL_KEYWORDS) {
            return self
                .finish(session, modality, input, TurnKind::Guidance, CONNECT_FIRST_MESSAGE.to_string())
                .await;
        }

        let outcome = self.dispatcher.dispatch(session, input, modality).await;
        TurnOutcome {
            relisten: self.should_relisten(session, outcome.spoken),
            response: outcome.direct,
            kind: TurnKind::General,
            spoken: outcome.spoken,
        }
    }

    async fn run_intent(&self, session: &mut SessionState, modality: Modality, intent: MailIntent) -> String {
        info!("Mail intent: {:?}", intent);
        match intent {
            MailIntent::FetchUnread { count } => self.adapter.list_unread(session, count).await,
            MailIntent::Read { identifier: Some(id) } => self.adapter.read(session, &id).await,
            MailIntent::Read { identifier: None } => WHICH_EMAIL_TO_READ_MESSAGE.to_string(),
            MailIntent::BeginReply => {
                if session.open_email.is_none() {
                    return match modality {
                        Modality::Voice => READ_FIRST_MESSAGE.to_string(),
                        Modality::Text => READ_FIRST_TEXT_MESSAGE.to_string(),
                    };
                }
                session.set_awaiting_reply_body(modality, true);
                let provider = session
                    .active_provider
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "email".to_string());
                match modality {
                    Modality::Voice => format!("What would you like to say in your {} reply?", provider),
                    Modality::Text => format!(
                        "What would you like to say in your {} reply? Please type your message.",
                        provider
                    ),
                }
            }
            MailIntent::MarkRead { identifier: Some(id) } => self.adapter.mark_read(session, &id).await,
            MailIntent::MarkUnread { identifier: Some(id) } => self.adapter.mark_unread(session, &id).await,
            MailIntent::MarkRead { identifier: None } => {
                "Please specify which email to mark as read, for example, 'mark as read email number two'.".to_string()
            }
            MailIntent::MarkUnread { identifier: None } => {
                "Please specify which email to mark as unread, for example, 'mark as unread email number two'.".to_string()
            }
        }
    }

    async fn connect(&self, session: &mut SessionState, provider: Provider) -> String {
        let Some(backend) = self.adapter.backend(provider) else {
            return SwitchError::ProviderNotConfigured(provider).to_string();
        };
        match backend.begin_authentication().await {
            Ok(None) => match self.adapter.set_active(session, provider) {
                Ok(confirmation) => format!("You're already signed in to {}. {}", provider, confirmation),
                Err(e) => e.to_string(),
            },
            Ok(Some(instructions)) => {
                session.auth_pending = Some(provider);
                instructions
            }
            Err(e) => {
                error!("Could not start {} sign-in: {}", provider, e);
                format!("Sorry, I couldn't start the {} sign-in. Details: {}", provider, e)
            }
        }
    }

    /// Clears the pending sign-in once the backend has a token or its
    /// sign-in flow is no longer running (failed, expired or abandoned).
    fn settle_auth_pending(&self, session: &mut SessionState) {
        let Some(provider) = session.auth_pending else {
            return;
        };
        let Some(backend) = self.adapter.backend(provider) else {
            session.auth_pending = None;
            return;
        };
        if backend.is_authenticated() {
            info!("{} sign-in completed", provider);
            session.auth_pending = None;
        } else if !backend.auth_in_progress() {
            warn!("{} sign-in ended without a token", provider);
            session.auth_pending = None;
        }
    }

    fn should_relisten(&self, session: &SessionState, spoken: bool) -> bool {
        spoken
            && session.continuous_listening
            && !session.awaiting_voice_reply
            && !session.awaiting_text_reply
            && session.auth_pending.is_none()
    }

    /// Speaks and records a handled command turn.
    async fn finish(
        &self,
        session: &mut SessionState,
        modality: Modality,
        input: &str,
        kind: TurnKind,
        response: String,
    ) -> TurnOutcome {
        session.direct_history.push(ChatMessage::user(input.to_string()));
        session.direct_history.push(ChatMessage::assistant(response.clone()));
        if let Some(log) = &self.transcript {
            log.append(TranscriptEntry::mail_turn(input, &response));
        }
        self.respond(session, modality, kind, response).await
    }

    async fn respond(&self, session: &SessionState, modality: Modality, kind: TurnKind, response: String) -> TurnOutcome {
        let spoken = modality == Modality::Voice || session.talking_mode;
        if spoken {
            self.speaker.speak(&response, &self.voice).await;
        }
        TurnOutcome {
            relisten: self.should_relisten(session, spoken),
            response,
            kind,
            spoken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_id(input: &str) -> Option<String> {
        match classify_mail_intent(input) {
            Some(MailIntent::Read { identifier }) => identifier,
            other => panic!("expected read intent for {:?}, got {:?}", input, other),
        }
    }

    fn fetch_count(input: &str) -> u32 {
        match classify_mail_intent(input) {
            Some(MailIntent::FetchUnread { count }) => count,
            other => panic!("expected fetch intent for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn fetch_phrases_and_counts() {
        assert_eq!(fetch_count("fetch unread email"), 5);
        assert_eq!(fetch_count("read my unread email"), 5);
        assert_eq!(fetch_count("check my email"), 5);
        assert_eq!(fetch_count("get my last email"), 5);
        assert_eq!(fetch_count("fetch 7 unread emails"), 7);
        assert_eq!(fetch_count("Fetch 10 unread emails"), 10);
        assert_eq!(fetch_count("get my last three emails"), 3);
        assert_eq!(fetch_count("check my email and get the last one"), 1);
    }

    #[test]
    fn read_identifiers() {
        assert_eq!(read_id("read email number 2").as_deref(), Some("2"));
        assert_eq!(read_id("read email 2").as_deref(), Some("2"));
        assert_eq!(read_id("read the first email").as_deref(), Some("1"));
        assert_eq!(read_id("open email three").as_deref(), Some("3"));
        assert_eq!(read_id("read email with subject meeting notes").as_deref(), Some("meeting notes"));
        assert_eq!(read_id("read email from John Doe").as_deref(), Some("John Doe"));
        assert_eq!(read_id("Open email Quarterly Report").as_deref(), Some("Quarterly Report"));
        assert_eq!(read_id("read email"), None);
    }

    #[test]
    fn number_words_inside_names_are_a_known_limitation() {
        // Three number words assemble to "123", too long, so "from" wins.
        assert_eq!(
            read_id("read email from One Two Three company").as_deref(),
            Some("One Two Three company")
        );
        // Two number words assemble to "12" and are taken as an ordinal.
        assert_eq!(read_id("read email from One Two company").as_deref(), Some("12"));
    }

    #[test]
    fn reply_and_mark_intents() {
        assert_eq!(classify_mail_intent("reply to this email"), Some(MailIntent::BeginReply));
        assert_eq!(classify_mail_intent("Reply email"), Some(MailIntent::BeginReply));
        assert_eq!(
            classify_mail_intent("mark as unread email number two"),
            Some(MailIntent::MarkUnread { identifier: Some("2".into()) })
        );
        assert_eq!(
            classify_mail_intent("mark as read the invoice email"),
            Some(MailIntent::MarkRead { identifier: Some("invoice".into()) })
        );
        assert_eq!(classify_mail_intent("mark as read"), Some(MailIntent::MarkRead { identifier: None }));
    }

    #[test]
    fn read_phrase_wins_over_fetch_words_in_the_identifier() {
        assert_eq!(read_id("read email from Get Smart").as_deref(), Some("Get Smart"));
        assert_eq!(
            read_id("read email with subject check-in reminder").as_deref(),
            Some("check-in reminder")
        );
        assert_eq!(
            read_id("open email with subject List of tasks").as_deref(),
            Some("List of tasks")
        );
    }

    #[test]
    fn fetch_needs_a_leading_command_verb() {
        assert_eq!(classify_mail_intent("how do I get more email subscribers"), None);
        assert_eq!(classify_mail_intent("my sister will show me her email later"), None);
        assert_eq!(fetch_count("can you show me my inbox"), 5);
        assert_eq!(fetch_count("please list 4 emails"), 4);
        assert_eq!(fetch_count("read my unread emails"), 5);
    }

    #[test]
    fn unread_email_is_not_a_read_command() {
        assert_eq!(classify_mail_intent("is there an unread email from bob"), None);
    }

    #[test]
    fn general_chat_is_not_mail() {
        assert_eq!(classify_mail_intent("what is the weather today"), None);
        assert_eq!(classify_mail_intent("tell me a joke"), None);
        assert_eq!(classify_mail_intent("this is not an email command"), None);
    }

    #[test]
    fn phrases_match_on_word_boundaries() {
        let u = Utterance::new("Please Stop Listening now");
        assert!(u.matches_any(STOP_LISTENING_PHRASES));
        let u = Utterance::new("use gmailer");
        assert!(switch_target(&u).is_none());
        assert_eq!(switch_target(&Utterance::new("Switch to Outlook please")), Some(Provider::Outlook));
    }

    #[test]
    fn spans_keep_original_casing() {
        let u = Utterance::new("Read Email From ACME Corp.");
        let idx = u.find_phrase("read email").unwrap();
        assert_eq!(u.text_after(idx), "From ACME Corp.");
        assert_eq!(extract_identifier(u.text_after(idx)).as_deref(), Some("ACME Corp"));
    }
}
