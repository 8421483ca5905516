//! Session registry and analytics
//!
//! Shared store of every session the process has orchestrated, safe
//! under concurrent session creation. Derived metrics and cross-session
//! aggregates are computed on demand and never mutate session state.
//!
//! Retention is bounded: once the store reaches capacity, the oldest
//! terminal session is evicted to make room. Active sessions are never
//! evicted, so the store can exceed capacity only while that many
//! sessions are simultaneously in flight.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

use crate::errors::{OrchestratorError, Result};
use crate::types::session::{SessionMetrics, SessionStatus, ThreadSession};

/// Shared handle to one registered session.
///
/// The cancel channel is the cooperative cancellation signal: pipeline
/// waits select on it, and `cancel_session` flips it.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Session id, duplicated out of the lock for cheap access
    pub id: String,

    /// The session record itself
    pub session: Arc<RwLock<ThreadSession>>,

    /// Cancellation signal; `true` once cancellation was requested
    pub cancel: watch::Sender<bool>,
}

impl SessionHandle {
    fn new(session: ThreadSession) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            id: session.id.clone(),
            session: Arc::new(RwLock::new(session)),
            cancel,
        }
    }

    /// True once cancellation has been requested for this session
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.subscribe().borrow()
    }
}

/// Cross-session aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// Sessions currently retained, any status
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub completed_sessions: usize,
    pub failed_sessions: usize,

    /// Mean session duration in milliseconds; active sessions measure
    /// against the current time
    pub avg_duration_ms: f64,

    /// Messages across every retained session
    pub total_messages: usize,

    /// Non-error fraction over every retained session's messages;
    /// 0 when no messages exist anywhere
    pub success_rate: f64,
}

struct RegistryInner {
    sessions: HashMap<String, SessionHandle>,
    /// Insertion order, oldest first; drives eviction
    order: VecDeque<String>,
}

/// Registry of all sessions, shared between the orchestrator and callers
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
}

impl SessionRegistry {
    /// Create a registry retaining at most `capacity` sessions
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, RegistryInner>> {
        self.inner
            .lock()
            .map_err(|e| OrchestratorError::Lock(e.to_string()))
    }

    /// Register a new session, rejecting duplicate ids.
    ///
    /// Evicts the oldest terminal session first when at capacity.
    pub fn insert(&self, session: ThreadSession) -> Result<SessionHandle> {
        let mut inner = self.lock()?;

        if inner.sessions.contains_key(&session.id) {
            return Err(OrchestratorError::DuplicateSession(session.id));
        }

        if inner.sessions.len() >= self.capacity {
            Self::evict_oldest_terminal(&mut inner);
        }

        let handle = SessionHandle::new(session);
        inner.order.push_back(handle.id.clone());
        inner.sessions.insert(handle.id.clone(), handle.clone());

        Ok(handle)
    }

    fn evict_oldest_terminal(inner: &mut RegistryInner) {
        let evict_id = inner.order.iter().position(|id| {
            inner
                .sessions
                .get(id)
                .and_then(|h| h.session.read().ok().map(|s| s.is_terminal()))
                .unwrap_or(true)
        });

        if let Some(pos) = evict_id {
            if let Some(id) = inner.order.remove(pos) {
                inner.sessions.remove(&id);
            }
        }
    }

    /// Look up a session handle by id
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.lock().ok()?.sessions.get(session_id).cloned()
    }

    /// Point-in-time copy of a session record
    pub fn snapshot(&self, session_id: &str) -> Option<ThreadSession> {
        let handle = self.get(session_id)?;
        let session = handle.session.read().ok()?;
        Some(session.clone())
    }

    /// Number of retained sessions
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.sessions.len()).unwrap_or(0)
    }

    /// True when no sessions are retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derived metrics for one session; None if unknown
    pub fn get_session_metrics(&self, session_id: &str) -> Option<SessionMetrics> {
        self.snapshot(session_id).map(|s| s.metrics(Utc::now()))
    }

    /// All sessions still in the active state
    pub fn get_active_sessions(&self) -> Vec<ThreadSession> {
        self.all_snapshots()
            .into_iter()
            .filter(|s| s.status == SessionStatus::Active)
            .collect()
    }

    /// Sessions ordered by start time descending, truncated to `limit`
    pub fn get_session_history(&self, limit: usize) -> Vec<ThreadSession> {
        let mut sessions = self.all_snapshots();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        sessions
    }

    /// Cross-session aggregates over every retained session
    pub fn get_analytics(&self) -> SessionAnalytics {
        let sessions = self.all_snapshots();
        let now = Utc::now();

        let mut active = 0usize;
        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut total_duration_ms = 0i64;
        let mut total_messages = 0usize;
        let mut ok_messages = 0usize;

        for session in &sessions {
            match session.status {
                SessionStatus::Active => active += 1,
                SessionStatus::Completed => completed += 1,
                SessionStatus::Failed => failed += 1,
            }

            let end = session.end_time.unwrap_or(now);
            total_duration_ms += (end - session.start_time).num_milliseconds();

            total_messages += session.messages.len();
            ok_messages += session.messages.iter().filter(|m| !m.is_error()).count();
        }

        SessionAnalytics {
            total_sessions: sessions.len(),
            active_sessions: active,
            completed_sessions: completed,
            failed_sessions: failed,
            avg_duration_ms: if sessions.is_empty() {
                0.0
            } else {
                total_duration_ms as f64 / sessions.len() as f64
            },
            total_messages,
            success_rate: if total_messages == 0 {
                0.0
            } else {
                ok_messages as f64 / total_messages as f64
            },
        }
    }

    fn all_snapshots(&self) -> Vec<ThreadSession> {
        let Ok(inner) = self.lock() else {
            return Vec::new();
        };

        inner
            .order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .filter_map(|h| h.session.read().ok().map(|s| s.clone()))
            .collect()
    }
}
