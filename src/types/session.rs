//! Session domain model
//!
//! The central `ThreadSession` entity: one end-to-end support or payment
//! interaction from a user query to a terminal outcome. Sessions are
//! mutated only by the pipeline that owns them and freeze permanently
//! once they reach a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::messages::{MessageType, ThreadMessage};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Sole initial state
    Active,
    /// Terminal: every applicable pipeline step finished
    Completed,
    /// Terminal: a step failed, timed out, or the session was cancelled
    Failed,
}

/// Interaction category, derived once from the user query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    VoiceSupport,
    PaymentProcessing,
    FraudDetection,
}

/// Handling priority, derived once from the user query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Per-session metadata, computed at creation and never recomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Raw user query text
    pub user_query: String,
    /// Classified interaction category
    pub session_type: SessionType,
    /// Classified handling priority
    pub priority: Priority,
}

/// One orchestrated interaction with its complete message trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSession {
    /// Caller-supplied session id, unique across the registry
    pub id: String,

    /// Handle into the thread transport; `None` only when thread
    /// creation itself failed, immutable once assigned
    pub thread_id: Option<String>,

    /// Participant agent ids; grows only, never shrinks
    pub participants: Vec<String>,

    /// Lifecycle state
    pub status: SessionStatus,

    /// Creation timestamp
    pub start_time: DateTime<Utc>,

    /// Set exactly once, at the transition into a terminal state
    pub end_time: Option<DateTime<Utc>>,

    /// Append-only message trail, ordered by timestamp
    pub messages: Vec<ThreadMessage>,

    /// Classification metadata
    pub metadata: SessionMetadata,
}

/// Metrics derived from a session; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Wall-clock duration in milliseconds; active sessions measure
    /// against the supplied "now"
    pub duration_ms: i64,
    /// Total messages in the trail
    pub message_count: usize,
    /// Current participant count
    pub participant_count: usize,
    /// Session status at computation time
    pub status: SessionStatus,
    /// Fraction of messages that are not error-kind; 0 for empty trails
    pub success_rate: f64,
    /// Mean gap between each request and its immediately following
    /// response, in milliseconds; 0 when no such pair exists
    pub avg_response_time_ms: f64,
}

impl ThreadSession {
    /// Create a new active session with the given participants
    pub fn new(id: impl Into<String>, participants: Vec<String>, metadata: SessionMetadata) -> Self {
        Self {
            id: id.into(),
            thread_id: None,
            participants,
            status: SessionStatus::Active,
            start_time: Utc::now(),
            end_time: None,
            messages: Vec::new(),
            metadata,
        }
    }

    /// True once the session reached `Completed` or `Failed`
    pub fn is_terminal(&self) -> bool {
        self.status != SessionStatus::Active
    }

    /// Assign the transport thread handle. Ignored if already assigned.
    pub fn assign_thread(&mut self, thread_id: impl Into<String>) {
        if self.thread_id.is_none() {
            self.thread_id = Some(thread_id.into());
        }
    }

    /// Append a message to the trail.
    ///
    /// Returns false without mutating anything if the session is already
    /// terminal; terminal sessions are read-only.
    pub fn push_message(&mut self, message: ThreadMessage) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Add a participant. Grow-only: duplicates are ignored. Returns
    /// false if the session is terminal.
    pub fn add_participant(&mut self, agent_id: &str) -> bool {
        if self.is_terminal() {
            return false;
        }
        if !self.participants.iter().any(|p| p == agent_id) {
            self.participants.push(agent_id.to_string());
        }
        true
    }

    /// Transition into `Completed`. Returns false if already terminal.
    pub fn complete(&mut self) -> bool {
        self.finalize(SessionStatus::Completed)
    }

    /// Transition into `Failed`. Returns false if already terminal.
    pub fn fail(&mut self) -> bool {
        self.finalize(SessionStatus::Failed)
    }

    fn finalize(&mut self, status: SessionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_time = Some(Utc::now());
        true
    }

    /// Compute derived metrics against the supplied clock reading.
    ///
    /// Active sessions report an in-flight duration estimate; terminal
    /// sessions measure start to end.
    pub fn metrics(&self, now: DateTime<Utc>) -> SessionMetrics {
        let end = self.end_time.unwrap_or(now);

        SessionMetrics {
            duration_ms: (end - self.start_time).num_milliseconds(),
            message_count: self.messages.len(),
            participant_count: self.participants.len(),
            status: self.status,
            success_rate: self.success_rate(),
            avg_response_time_ms: self.avg_response_time_ms(),
        }
    }

    /// Fraction of non-error messages; 0 for an empty trail
    pub fn success_rate(&self) -> f64 {
        if self.messages.is_empty() {
            return 0.0;
        }
        let ok = self.messages.iter().filter(|m| !m.is_error()).count();
        ok as f64 / self.messages.len() as f64
    }

    /// Mean request-to-response gap over adjacent pairs, in milliseconds.
    ///
    /// Only a response immediately following a request counts as a pair;
    /// anything else is excluded. No pairs yields 0.
    pub fn avg_response_time_ms(&self) -> f64 {
        let mut total_ms = 0i64;
        let mut pairs = 0u32;

        for window in self.messages.windows(2) {
            if window[0].message_type == MessageType::Request
                && window[1].message_type == MessageType::Response
            {
                total_ms += (window[1].timestamp - window[0].timestamp).num_milliseconds();
                pairs += 1;
            }
        }

        if pairs == 0 {
            0.0
        } else {
            total_ms as f64 / pairs as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_session() -> ThreadSession {
        ThreadSession::new(
            "s1",
            vec!["voice-listener-agent".to_string(), "brain-agent".to_string()],
            SessionMetadata {
                user_query: "help".to_string(),
                session_type: SessionType::VoiceSupport,
                priority: Priority::Low,
            },
        )
    }

    #[test]
    fn test_new_session_is_active() {
        let session = test_session();
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.end_time.is_none());
        assert!(!session.is_terminal());
    }

    #[test]
    fn test_terminal_session_is_frozen() {
        let mut session = test_session();
        assert!(session.complete());
        let end = session.end_time;
        assert!(end.is_some());

        // No mutation of any kind after a terminal transition
        assert!(!session.push_message(ThreadMessage::system("late", MessageType::Response)));
        assert!(!session.add_participant("executor-agent"));
        assert!(!session.fail());
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.end_time, end);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_thread_id_immutable_once_assigned() {
        let mut session = test_session();
        session.assign_thread("thread_1");
        session.assign_thread("thread_2");
        assert_eq!(session.thread_id.as_deref(), Some("thread_1"));
    }

    #[test]
    fn test_participants_grow_only_no_duplicates() {
        let mut session = test_session();
        assert!(session.add_participant("executor-agent"));
        assert!(session.add_participant("executor-agent"));
        assert_eq!(session.participants.len(), 3);
    }

    #[test]
    fn test_success_rate_empty_trail_is_zero() {
        let session = test_session();
        assert_eq!(session.success_rate(), 0.0);
        let metrics = session.metrics(Utc::now());
        assert_eq!(metrics.success_rate, 0.0);
        assert_eq!(metrics.avg_response_time_ms, 0.0);
    }

    #[test]
    fn test_success_rate_counts_non_errors() {
        let mut session = test_session();
        session.push_message(ThreadMessage::system("q", MessageType::Request));
        session.push_message(ThreadMessage::new("brain-agent", "a", MessageType::Response));
        session.push_message(ThreadMessage::system("boom", MessageType::Error));
        session.push_message(ThreadMessage::system("bye", MessageType::Coordination));

        assert!((session.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_avg_response_time_pairs_adjacent_only() {
        let mut session = test_session();
        let base = Utc::now();

        let mut request = ThreadMessage::system("q1", MessageType::Request);
        request.timestamp = base;
        let mut response = ThreadMessage::new("brain-agent", "a1", MessageType::Response);
        response.timestamp = base + Duration::milliseconds(200);
        // A coordination message between request and response breaks the pair
        let mut coord = ThreadMessage::system("note", MessageType::Coordination);
        coord.timestamp = base + Duration::milliseconds(300);
        let mut orphan_request = ThreadMessage::system("q2", MessageType::Request);
        orphan_request.timestamp = base + Duration::milliseconds(400);

        session.push_message(request);
        session.push_message(response);
        session.push_message(coord);
        session.push_message(orphan_request);

        assert!((session.avg_response_time_ms() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_active_session_uses_now() {
        let session = test_session();
        let now = session.start_time + Duration::milliseconds(500);
        let metrics = session.metrics(now);
        assert_eq!(metrics.duration_ms, 500);
        assert_eq!(metrics.status, SessionStatus::Active);
        assert_eq!(metrics.participant_count, 2);
    }

    #[test]
    fn test_messages_non_decreasing_timestamps() {
        let mut session = test_session();
        for i in 0..10 {
            session.push_message(ThreadMessage::system(format!("m{}", i), MessageType::Request));
        }
        for window in session.messages.windows(2) {
            assert!(window[0].timestamp <= window[1].timestamp);
        }
    }
}
