#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use mockall::mock;
use ollama_rs::generation::chat::ChatMessage;
use dual_brain::models::email::{EmailDetail, MailHeader};
use dual_brain::models::session_state::Provider;
use dual_brain::services::chat_service::{ChatReply, ChatStrategy, ConversationDispatcher};
use dual_brain::services::command_router::CommandRouter;
use dual_brain::services::mail_adapter::MailAdapter;
use dual_brain::services::mail_backend::{MailBackend, MailError, MailProviders};
use dual_brain::services::speech::{SpeechInput, SpeechOutput};
use dual_brain::services::transcript_log::TranscriptLog;

mock! {
    pub Backend {}

    #[async_trait]
    impl MailBackend for Backend {
        fn provider(&self) -> Provider;
        fn is_authenticated(&self) -> bool;
        fn auth_in_progress(&self) -> bool;
        async fn begin_authentication(&self) -> Result<Option<String>, MailError>;
        async fn list_unread(&self, max_results: u32) -> Result<Vec<MailHeader>, MailError>;
        async fn read(&self, id: &str) -> Result<Option<EmailDetail>, MailError>;
        async fn reply(&self, id: &str, text: &str) -> Result<bool, MailError>;
        async fn mark_read(&self, id: &str) -> Result<bool, MailError>;
        async fn mark_unread(&self, id: &str) -> Result<bool, MailError>;
    }
}

/// Answers deterministically and records every input it saw.
pub struct ScriptedStrategy {
    name: &'static str,
    pub inputs: Arc<Mutex<Vec<String>>>,
}

impl ScriptedStrategy {
    pub fn new(name: &'static str) -> Self {
        ScriptedStrategy { name, inputs: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl ChatStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn process_message(&self, history: &mut Vec<ChatMessage>, input: &str) -> ChatReply {
        self.inputs.lock().unwrap().push(input.to_string());
        let response = format!("{} answer to {}", self.name, input);
        history.push(ChatMessage::user(input.to_string()));
        history.push(ChatMessage::assistant(response.clone()));
        ChatReply {
            plan: (self.name == "thinking").then(|| format!("plan for {}", input)),
            response,
        }
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechOutput for RecordingSpeaker {
    async fn speak(&self, text: &str, _voice: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Plays back a fixed sequence of captures; `None` is silence, and an
/// exhausted script keeps returning silence.
pub struct ScriptedListener {
    script: Mutex<VecDeque<Option<String>>>,
    pub listens: AtomicUsize,
}

impl ScriptedListener {
    pub fn new(script: Vec<Option<&str>>) -> Self {
        ScriptedListener {
            script: Mutex::new(script.into_iter().map(|s| s.map(String::from)).collect()),
            listens: AtomicUsize::new(0),
        }
    }

    pub fn listens(&self) -> usize {
        self.listens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechInput for ScriptedListener {
    async fn listen(&self) -> Option<String> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().flatten()
    }
}

pub struct Harness {
    pub router: Arc<CommandRouter>,
    pub speaker: Arc<RecordingSpeaker>,
    pub thinking: Arc<Mutex<Vec<String>>>,
    pub direct: Arc<Mutex<Vec<String>>>,
}

pub fn harness(gmail: Option<MockBackend>, outlook: Option<MockBackend>) -> Harness {
    harness_with_transcript(gmail, outlook, None)
}

pub fn harness_with_transcript(
    gmail: Option<MockBackend>,
    outlook: Option<MockBackend>,
    transcript: Option<Arc<TranscriptLog>>,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let thinking = ScriptedStrategy::new("thinking");
    let direct = ScriptedStrategy::new("direct");
    let thinking_inputs = Arc::clone(&thinking.inputs);
    let direct_inputs = Arc::clone(&direct.inputs);
    let speaker = Arc::new(RecordingSpeaker::default());

    let providers = MailProviders {
        gmail: gmail.map(|b| Arc::new(b) as Arc<dyn MailBackend>),
        outlook: outlook.map(|b| Arc::new(b) as Arc<dyn MailBackend>),
    };
    let dispatcher = ConversationDispatcher::new(
        Arc::new(thinking),
        Arc::new(direct),
        speaker.clone(),
        "alloy",
        transcript.clone(),
    );
    let router = CommandRouter::new(MailAdapter::new(providers), dispatcher, speaker.clone(), "alloy", transcript);
    Harness {
        router: Arc::new(router),
        speaker,
        thinking: thinking_inputs,
        direct: direct_inputs,
    }
}

pub fn headers(count: usize) -> Vec<MailHeader> {
    let senders = ["alice@example.com", "Bob <bob@example.com>", "carol@example.com"];
    let subjects = ["Hello", "Meeting notes", "Quarterly report"];
    (0..count)
        .map(|i| MailHeader {
            id: format!("m{}", i + 1),
            subject: subjects.get(i).map(|s| s.to_string()).unwrap_or_else(|| format!("Update {}", i + 1)),
            sender: senders.get(i).map(|s| s.to_string()).unwrap_or_else(|| "news@example.com".to_string()),
        })
        .collect()
}

pub fn detail(id: &str, subject: &str, sender: &str) -> EmailDetail {
    EmailDetail {
        id: id.to_string(),
        subject: subject.to_string(),
        sender: sender.to_string(),
        body: "See you at noon.".to_string(),
    }
}
