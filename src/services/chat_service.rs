use std::sync::Arc;
use async_trait::async_trait;
use log::{error, info};
use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};
use ollama_rs::Ollama;
use crate::config;
use crate::models::session_state::{Modality, SessionState};
use crate::models::transcript::TranscriptEntry;
use crate::services::speech::SpeechOutput;
use crate::services::transcript_log::TranscriptLog;

/// What one strategy produced for a turn. Only the planning strategy fills `plan`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub plan: Option<String>,
    pub response: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Backend(String),
}

impl From<ollama_rs::error::OllamaError> for ChatError {
    fn from(error: ollama_rs::error::OllamaError) -> Self {
        ChatError::Backend(error.to_string())
    }
}

/// A chat response strategy. Never fails: errors come back as the response text.
#[async_trait]
pub trait ChatStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn process_message(&self, history: &mut Vec<ChatMessage>, input: &str) -> ChatReply;
}

pub fn create_ollama() -> Ollama {
    Ollama::new(config::ollama_host(), config::ollama_port())
}

async fn complete(ollama: &Ollama, model: &str, messages: Vec<ChatMessage>) -> Result<String, ChatError> {
    let request = ChatMessageRequest::new(model.to_string(), messages);
    let response = ollama.send_chat_messages(request).await?;
    Ok(response.message.content)
}

/// Plans first, then answers with the plan as hidden guidance.
pub struct ThinkingChat {
    ollama: Ollama,
    model: String,
    planner_prompt: String,
}

impl ThinkingChat {
    pub fn new(ollama: Ollama, model: impl Into<String>, planner_prompt: impl Into<String>) -> Self {
        ThinkingChat {
            ollama,
            model: model.into(),
            planner_prompt: planner_prompt.into(),
        }
    }

    async fn generate_plan(&self, input: &str) -> String {
        let messages = vec![
            ChatMessage::system(self.planner_prompt.clone()),
            ChatMessage::user(input.to_string()),
        ];
        match complete(&self.ollama, &self.model, messages).await {
            Ok(plan) => plan,
            Err(e) => {
                error!("Error generating thinking plan: {}", e);
                format!("Error generating thinking plan: {}", e)
            }
        }
    }

    async fn generate_final_response(&self, input: &str, plan: &str) -> String {
        let system_prompt = format!(
            "You are a helpful assistant. Use the following thinking plan to guide your response to the user:\n\n{}\n\nRespond directly to the user's query using this plan, but do NOT mention that you're following a plan or include the plan in your response.",
            plan
        );
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(input.to_string()),
        ];
        match complete(&self.ollama, &self.model, messages).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error generating final response: {}", e);
                format!("Error generating final response: {}", e)
            }
        }
    }
}

#[async_trait]
impl ChatStrategy for ThinkingChat {
    fn name(&self) -> &str {
        "thinking"
    }

    async fn process_message(&self, history: &mut Vec<ChatMessage>, input: &str) -> ChatReply {
        history.push(ChatMessage::user(input.to_string()));
        let plan = self.generate_plan(input).await;
        let response = self.generate_final_response(input, &plan).await;
        history.push(ChatMessage::assistant(response.clone()));
        ChatReply {
            plan: Some(plan),
            response,
        }
    }
}

/// Answers straight from the running conversation.
pub struct DirectChat {
    ollama: Ollama,
    model: String,
}

impl DirectChat {
    pub fn new(ollama: Ollama, model: impl Into<String>) -> Self {
        DirectChat {
            ollama,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatStrategy for DirectChat {
    fn name(&self) -> &str {
        "direct"
    }

    async fn process_message(&self, history: &mut Vec<ChatMessage>, input: &str) -> ChatReply {
        history.push(ChatMessage::user(input.to_string()));
        match complete(&self.ollama, &self.model, history.clone()).await {
            Ok(response) => {
                history.push(ChatMessage::assistant(response.clone()));
                ChatReply { plan: None, response }
            }
            Err(e) => {
                let message = format!("Error generating response: {}", e);
                error!("{}", message);
                history.push(ChatMessage::system(message.clone()));
                ChatReply { plan: None, response: message }
            }
        }
    }
}

/// Result of a general (non-mail) turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub thinking: ChatReply,
    pub direct: String,
    pub spoken: bool,
}

/// Runs every general turn through both strategies so their transcripts stay
/// aligned, and speaks only the direct answer.
pub struct ConversationDispatcher {
    thinking: Arc<dyn ChatStrategy>,
    direct: Arc<dyn ChatStrategy>,
    speaker: Arc<dyn SpeechOutput>,
    voice: String,
    transcript: Option<Arc<TranscriptLog>>,
}

impl ConversationDispatcher {
    pub fn new(
        thinking: Arc<dyn ChatStrategy>,
        direct: Arc<dyn ChatStrategy>,
        speaker: Arc<dyn SpeechOutput>,
        voice: impl Into<String>,
        transcript: Option<Arc<TranscriptLog>>,
    ) -> Self {
        ConversationDispatcher {
            thinking,
            direct,
            speaker,
            voice: voice.into(),
            transcript,
        }
    }

    pub async fn dispatch(&self, session: &mut SessionState, input: &str, modality: Modality) -> DispatchOutcome {
        session.pending_input = input.to_string();
        info!("Dispatching general input to {} and {} strategies", self.thinking.name(), self.direct.name());

        let thinking = self.thinking.process_message(&mut session.thinking_history, input).await;
        if let Some(plan) = &thinking.plan {
            session.thinking_plans.push(plan.clone());
        }
        let direct = self.direct.process_message(&mut session.direct_history, input).await.response;

        if let Some(log) = &self.transcript {
            log.append(TranscriptEntry::chat_turn(
                input,
                thinking.plan.as_deref().unwrap_or_default(),
                &thinking.response,
                &direct,
            ));
        }

        // Planning commentary is not read aloud.
        let spoken = session.talking_mode || modality == Modality::Voice;
        if spoken {
            self.speaker.speak(&direct, &self.voice).await;
        }

        session.pending_input.clear();
        DispatchOutcome { thinking, direct, spoken }
    }

    /// Empties both strategies' histories for this session.
    pub fn clear(&self, session: &mut SessionState) {
        session.thinking_history.clear();
        session.thinking_plans.clear();
        session.direct_history.clear();
    }
}
