use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Speech capture. `None` means silence or a recognition failure.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen(&self) -> Option<String>;
}

/// Speech synthesis. Blocks until playback is done; failures degrade to
/// printing and are never reported back.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, voice: &str);
}

/// Reads one line from stdin per listen. An empty line counts as silence.
pub struct ConsoleListener {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    closed: AtomicBool,
}

impl ConsoleListener {
    pub fn new() -> Self {
        ConsoleListener {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            closed: AtomicBool::new(false),
        }
    }

    /// True once stdin reached end of input.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for ConsoleListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechInput for ConsoleListener {
    async fn listen(&self) -> Option<String> {
        if self.is_closed() {
            return None;
        }
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(b"Listening... ").await;
        let _ = stdout.flush().await;

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    debug!("Heard silence");
                    None
                } else {
                    info!("User said: {}", line);
                    Some(line)
                }
            }
            Ok(None) => {
                self.closed.store(true, Ordering::SeqCst);
                None
            }
            Err(e) => {
                warn!("Could not read from stdin: {}", e);
                None
            }
        }
    }
}

/// Prints what would be spoken.
pub struct ConsoleSpeaker;

#[async_trait]
impl SpeechOutput for ConsoleSpeaker {
    async fn speak(&self, text: &str, voice: &str) {
        if text.trim().is_empty() {
            debug!("No text provided to speak.");
            return;
        }
        println!("[{}] {}", voice, text);
    }
}

/// For surfaces where the client does its own synthesis.
pub struct SilentSpeaker;

#[async_trait]
impl SpeechOutput for SilentSpeaker {
    async fn speak(&self, text: &str, voice: &str) {
        debug!("Leaving synthesis of {} chars with voice {} to the client", text.len(), voice);
    }
}
