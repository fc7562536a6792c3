mod common;

use std::sync::Arc;
use dual_brain::config::MAX_SILENT_RELISTENS;
use dual_brain::models::session_state::{Provider, SessionState};
use dual_brain::services::voice_loop::VoiceLoop;
use common::{detail, harness, MockBackend, ScriptedListener};

#[tokio::test]
async fn silence_rearms_capture_a_bounded_number_of_times() {
    let h = harness(None, None);
    let listener = Arc::new(ScriptedListener::new(vec![]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();
    session.continuous_listening = true;

    let outcomes = voice_loop.listen_again(&mut session, None).await;

    assert!(outcomes.is_empty());
    assert_eq!(listener.listens(), MAX_SILENT_RELISTENS as usize);
    assert!(session.continuous_listening);
}

#[tokio::test]
async fn without_continuous_listening_one_silence_ends_the_cycle() {
    let h = harness(None, None);
    let listener = Arc::new(ScriptedListener::new(vec![None, Some("hello")]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();

    let outcomes = voice_loop.listen_again(&mut session, None).await;

    assert!(outcomes.is_empty());
    assert_eq!(listener.listens(), 1);
}

#[tokio::test]
async fn speech_resets_the_silence_count() {
    let h = harness(None, None);
    let listener = Arc::new(ScriptedListener::new(vec![
        Some("hello"),
        None,
        Some("tell me more"),
    ]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();
    session.continuous_listening = true;

    let outcomes = voice_loop.listen_again(&mut session, None).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.spoken && o.relisten));
    // hello, silence, tell me more, then three silences
    assert_eq!(listener.listens(), 3 + MAX_SILENT_RELISTENS as usize);
    assert_eq!(h.speaker.spoken.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stop_listening_ends_the_cycle() {
    let h = harness(None, None);
    let listener = Arc::new(ScriptedListener::new(vec![Some("never heard")]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();
    session.continuous_listening = true;

    let outcomes = voice_loop.listen_again(&mut session, Some("stop listening".to_string())).await;

    assert_eq!(outcomes.len(), 1);
    assert!(!session.continuous_listening);
    assert_eq!(listener.listens(), 0);
}

#[tokio::test]
async fn reply_prompt_waits_instead_of_relistening() {
    let mut gmail = MockBackend::new();
    gmail.expect_reply().never();
    let h = harness(Some(gmail), None);
    let listener = Arc::new(ScriptedListener::new(vec![Some("never heard")]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();
    session.active_provider = Some(Provider::Gmail);
    session.open_email = Some(detail("m1", "Hello", "alice@example.com"));
    session.continuous_listening = true;

    let outcomes = voice_loop.listen_again(&mut session, Some("reply to this email".to_string())).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].response, "What would you like to say in your Gmail reply?");
    assert!(!outcomes[0].relisten);
    assert!(session.awaiting_voice_reply);
    assert_eq!(listener.listens(), 0);
}

#[tokio::test]
async fn run_turn_routes_one_capture_as_voice() {
    let h = harness(None, None);
    let listener = Arc::new(ScriptedListener::new(vec![Some("start listening")]));
    let voice_loop = VoiceLoop::new(h.router.clone(), listener.clone());
    let mut session = SessionState::new();

    let outcome = voice_loop.run_turn(&mut session).await.unwrap();

    assert!(session.continuous_listening);
    assert!(outcome.spoken);
    assert!(outcome.relisten);
    assert!(voice_loop.run_turn(&mut session).await.is_none());
}
