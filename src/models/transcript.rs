use serde::{Deserialize, Serialize};

/// One persisted turn. Mail turns fill only `response`; general turns carry
/// both strategies' outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: String,
    pub user_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_response: Option<String>,
}

impl TranscriptEntry {
    pub fn mail_turn(user_input: &str, response: &str) -> Self {
        TranscriptEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            user_input: user_input.to_string(),
            response: Some(response.to_string()),
            thinking_plan: None,
            thinking_response: None,
            direct_response: None,
        }
    }

    pub fn chat_turn(user_input: &str, plan: &str, thinking: &str, direct: &str) -> Self {
        TranscriptEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            user_input: user_input.to_string(),
            response: None,
            thinking_plan: Some(plan.to_string()),
            thinking_response: Some(thinking.to_string()),
            direct_response: Some(direct.to_string()),
        }
    }
}
