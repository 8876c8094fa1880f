//! Conversation sessions
//!
//! A [`Session`] owns one conversation's history and state. Sessions are
//! shared as `Arc<Mutex<Session>>`, so at most one turn runs per session at a
//! time while different sessions proceed independently.
//!
//! The [`SessionStore`] is bounded: sessions unused for longer than the idle
//! TTL are dropped, and once the store is full the least recently used
//! session is evicted to make room.

use crate::agent::history::ConversationHistory;
use crate::agent::state::ConversationState;
use crate::providers::{ChatMessage, Role};
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

/// Default idle time after which a stored session is dropped
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of stored sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// A session behind its single-writer lock
pub type SharedSession = Arc<Mutex<Session>>;

/// One user's conversation
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    history: ConversationHistory,
    state: ConversationState,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session seeded with the system message
    pub fn new(system: ChatMessage, max_history: usize) -> Self {
        Self::with_id(Uuid::new_v4(), system, max_history)
    }

    /// Creates a session with a caller-chosen id
    pub fn with_id(id: Uuid, system: ChatMessage, max_history: usize) -> Self {
        let mut history = ConversationHistory::new(max_history);
        history.initialize(Some(system));
        Self {
            id,
            history,
            state: ConversationState::default(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConversationState {
        &mut self.state
    }

    /// Number of user messages currently held
    pub fn user_turns(&self) -> usize {
        self.history
            .messages()
            .iter()
            .filter(|m| m.role() == Role::User)
            .count()
    }

    /// Starts over with a fresh system message and default state
    pub fn reset(&mut self, system: ChatMessage) {
        self.history.initialize(Some(system));
        self.state.reset();
        tracing::debug!("Session {} reset", self.id);
    }
}

struct StoredSession {
    session: SharedSession,
    last_used: Instant,
}

/// In-memory registry of live sessions
///
/// Backed by an `LruCache`, so lookups refresh recency and inserting into a
/// full store drops the least recently used session.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<LruCache<Uuid, StoredSession>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store dropping sessions idle for `idle_ttl` and holding at
    /// most `max_sessions` (at least one)
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Arc::new(RwLock::new(LruCache::new(capacity))),
            idle_ttl,
        }
    }

    /// Registers a session and returns its shared handle
    pub async fn insert(&self, session: Session) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        self.store_new(&mut sessions, id, shared.clone());
        tracing::debug!("Registered session {}", id);
        shared
    }

    /// Returns the session for `id` and marks it as used
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, id)
    }

    /// Returns the session for `id`, creating it with `make` when unknown
    pub async fn get_or_insert_with<F>(&self, id: Uuid, make: F) -> SharedSession
    where
        F: FnOnce() -> Session,
    {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = self.touch(&mut sessions, id) {
            return existing;
        }

        let shared = Arc::new(Mutex::new(make()));
        self.store_new(&mut sessions, id, shared.clone());
        tracing::debug!("Created session {}", id);
        shared
    }

    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions
            .write()
            .await
            .pop(&id)
            .map(|stored| stored.session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_idle(&self, stored: &StoredSession, now: Instant) -> bool {
        now.duration_since(stored.last_used) > self.idle_ttl
    }

    fn touch(
        &self,
        sessions: &mut LruCache<Uuid, StoredSession>,
        id: Uuid,
    ) -> Option<SharedSession> {
        let now = Instant::now();
        let stored = sessions.get_mut(&id)?;
        if self.is_idle(stored, now) {
            sessions.pop(&id);
            tracing::debug!("Session {} expired", id);
            return None;
        }
        stored.last_used = now;
        Some(stored.session.clone())
    }

    fn store_new(
        &self,
        sessions: &mut LruCache<Uuid, StoredSession>,
        id: Uuid,
        session: SharedSession,
    ) {
        let now = Instant::now();
        let idle: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, stored)| self.is_idle(stored, now))
            .map(|(id, _)| *id)
            .collect();
        for stale in &idle {
            sessions.pop(stale);
        }
        if !idle.is_empty() {
            tracing::debug!("Dropped {} idle sessions", idle.len());
        }

        let stored = StoredSession {
            session,
            last_used: now,
        };
        if let Some((evicted, _)) = sessions.push(id, stored) {
            if evicted != id {
                tracing::debug!("Evicted least recently used session {}", evicted);
            }
        }
    }
}
