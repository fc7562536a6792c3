use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use log::{debug, warn};
use crate::models::transcript::TranscriptEntry;

/// Append-only JSON array of turns. Every failure is logged and swallowed.
pub struct TranscriptLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TranscriptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TranscriptLog {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<TranscriptEntry> {
        if !self.path.exists() {
            return Vec::new();
        }
        match fs::read_to_string(&self.path).map(|s| serde_json::from_str::<Vec<TranscriptEntry>>(&s)) {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!("Error loading chat history from {}: {}", self.path.display(), e);
                Vec::new()
            }
            Err(e) => {
                warn!("Error reading chat history from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn append(&self, entry: TranscriptEntry) {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut entries = self.load();
        entries.push(entry);
        if let Err(e) = self.save(&entries) {
            warn!("Error saving chat history to {}: {}", self.path.display(), e);
        } else {
            debug!("Transcript now holds {} turns", entries.len());
        }
    }

    fn save(&self, entries: &[TranscriptEntry]) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}
