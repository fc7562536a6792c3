use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use log::{debug, info};
use uuid::Uuid;
use crate::config::SESSION_IDLE_TIMEOUT;
use crate::models::session_state::SessionState;

pub type SharedSession = Arc<tokio::sync::Mutex<SessionState>>;

struct SessionEntry {
    state: SharedSession,
    last_seen: Instant,
}

/// Per-browser session state keyed by the id stored in the session cookie.
/// Each entry has its own async lock so one user's turns run one at a time.
/// Idle entries are evicted whenever a new session is created.
#[derive(Clone)]
pub struct GlobalSessionManager {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    idle_timeout: Duration,
}

impl Default for GlobalSessionManager {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl GlobalSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        GlobalSessionManager {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Creates a fresh session and returns its id.
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        if sessions.len() < before {
            debug!("Evicted {} idle session(s)", before - sessions.len());
        }
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                state: Arc::new(tokio::sync::Mutex::new(SessionState::new())),
                last_seen: Instant::now(),
            },
        );
        info!("Initialized user session: {} ({} active)", session_id, sessions.len());
        session_id
    }

    /// Retrieves a session if it exists and marks it as recently used.
    pub fn get(&self, session_id: &str) -> Option<SharedSession> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(session_id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.state))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
