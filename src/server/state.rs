//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::SessionId;
use crate::chat::engine::ChatEngine;
use crate::chat::session::ConversationSession;
use crate::chat::usage::UsageEstimate;

/// One live conversation and its bookkeeping.
#[derive(Debug)]
pub struct SessionEntry {
    /// Conversation state.
    pub session: ConversationSession,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last time a request touched the session.
    pub last_active: DateTime<Utc>,
    /// Estimate from the most recent turn, if any.
    pub last_usage: Option<UsageEstimate>,
}

impl SessionEntry {
    /// Wrap a fresh session.
    #[must_use]
    pub fn new(session: ConversationSession) -> Self {
        let now = Utc::now();
        Self {
            session,
            created_at: now,
            last_active: now,
            last_usage: None,
        }
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Whether the session has been idle for longer than `ttl` at `now`.
    #[must_use]
    pub fn is_idle(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        (now - self.last_active)
            .to_std()
            .is_ok_and(|idle| idle > ttl)
    }
}

/// Shared handle to one session; a turn holds the lock for its whole duration.
pub type SharedSession = Arc<Mutex<SessionEntry>>;

/// Shared application state.
pub struct AppState {
    /// Turn engine.
    pub engine: ChatEngine,
    /// Live sessions, owned by the shell and never persisted.
    pub sessions: DashMap<SessionId, SharedSession>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// # Errors
    /// Returns an error if the engine cannot be created.
    pub fn new(config: &ChatConfig) -> ChatResult<Arc<Self>> {
        let engine = ChatEngine::from_config(config)?;
        Ok(Self::with_engine(engine))
    }

    /// Build state around an existing engine.
    #[must_use]
    pub fn with_engine(engine: ChatEngine) -> Arc<Self> {
        Arc::new(Self {
            engine,
            sessions: DashMap::new(),
        })
    }

    /// Register a new session and return its id.
    pub fn insert_session(&self, session: ConversationSession) -> SessionId {
        let id = SessionId::new();
        self.sessions
            .insert(id, Arc::new(Mutex::new(SessionEntry::new(session))));
        id
    }

    /// Handle to a live session.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove_session(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Remove sessions idle for longer than `ttl`. Sessions whose lock is
    /// held (a turn in flight) are kept. Returns the number removed.
    pub fn sweep_idle(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, shared| !matches!(shared.try_lock(), Ok(entry) if entry.is_idle(ttl, now)));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!(removed, live = self.sessions.len(), "idle sessions swept");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::chat::core::config::ProviderKind;

    const HOUR: Duration = Duration::from_secs(3600);

    fn echo_state() -> ChatResult<Arc<AppState>> {
        let mut config = ChatConfig::default();
        config.llm.provider = ProviderKind::Echo;
        AppState::new(&config)
    }

    #[tokio::test]
    async fn test_sweep_removes_only_idle_sessions() -> ChatResult<()> {
        let state = echo_state()?;
        let stale = state.insert_session(state.engine.start_session(None)?);
        let fresh = state.insert_session(state.engine.start_session(None)?);

        if let Some(shared) = state.session(&stale) {
            shared.lock().await.last_active = Utc::now() - TimeDelta::hours(2);
        }

        let removed = state.sweep_idle(HOUR, Utc::now());

        assert_eq!(removed, 1);
        assert!(state.session(&stale).is_none());
        assert!(state.session(&fresh).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_keeps_locked_sessions() -> ChatResult<()> {
        let state = echo_state()?;
        let id = state.insert_session(state.engine.start_session(None)?);
        let shared = state.session(&id);

        let guard = match &shared {
            Some(shared) => Some(shared.lock().await),
            None => None,
        };
        let later = Utc::now() + TimeDelta::hours(5);
        assert_eq!(state.sweep_idle(HOUR, later), 0);
        drop(guard);

        assert_eq!(state.sweep_idle(HOUR, later), 1);
        assert!(state.sessions.is_empty());
        Ok(())
    }

    #[test]
    fn test_touch_resets_idle_clock() -> ChatResult<()> {
        let state = echo_state()?;
        let mut entry = SessionEntry::new(state.engine.start_session(None)?);
        entry.last_active = Utc::now() - TimeDelta::minutes(30);
        assert!(entry.is_idle(Duration::from_secs(600), Utc::now()));
        entry.touch();
        assert!(!entry.is_idle(Duration::from_secs(600), Utc::now()));
        Ok(())
    }
}
