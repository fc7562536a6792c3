use std::sync::Arc;
use log::{debug, info};
use crate::config::MAX_SILENT_RELISTENS;
use crate::models::session_state::{Modality, SessionState};
use crate::services::command_router::{CommandRouter, TurnOutcome};
use crate::services::speech::SpeechInput;

/// Capture, route, speak, and re-arm capture while continuous listening
/// is on. Re-arming gives up after a run of silent captures.
pub struct VoiceLoop {
    router: Arc<CommandRouter>,
    listener: Arc<dyn SpeechInput>,
}

impl VoiceLoop {
    pub fn new(router: Arc<CommandRouter>, listener: Arc<dyn SpeechInput>) -> Self {
        VoiceLoop { router, listener }
    }

    /// One capture and, if something was heard, one routed turn.
    pub async fn run_turn(&self, session: &mut SessionState) -> Option<TurnOutcome> {
        let heard = self.listener.listen().await?;
        Some(self.router.handle(&heard, Modality::Voice, session).await)
    }

    /// Handles `first` (or captures it), then keeps listening for as long
    /// as each outcome asks for it. Returns every turn handled.
    pub async fn listen_again(&self, session: &mut SessionState, first: Option<String>) -> Vec<TurnOutcome> {
        let mut outcomes = Vec::new();
        let mut pending = first;
        let mut silences = 0;

        loop {
            let heard = match pending.take() {
                Some(text) => Some(text),
                None => self.listener.listen().await,
            };
            let Some(text) = heard else {
                silences += 1;
                if !session.continuous_listening || silences >= MAX_SILENT_RELISTENS {
                    info!("Stopped re-arming capture after {} silent listens", silences);
                    break;
                }
                debug!("Silent capture {} of {}, listening again", silences, MAX_SILENT_RELISTENS);
                continue;
            };

            silences = 0;
            let outcome = self.router.handle(&text, Modality::Voice, session).await;
            let relisten = outcome.relisten;
            outcomes.push(outcome);
            if !relisten {
                break;
            }
        }
        outcomes
    }
}
