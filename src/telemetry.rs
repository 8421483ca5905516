//! Telemetry for session orchestration
//!
//! Collects pipeline events (session lifecycle, per-step outcomes) for
//! monitoring. Purely observational; the orchestrator works the same
//! with or without a collector attached.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // Session lifecycle
    SessionStarted {
        session_id: String,
        timestamp: Instant,
    },
    SessionCompleted {
        session_id: String,
        message_count: usize,
        timestamp: Instant,
    },
    SessionFailed {
        session_id: String,
        reason: String,
        timestamp: Instant,
    },
    SessionCancelled {
        session_id: String,
        timestamp: Instant,
    },

    // Pipeline steps
    StepStarted {
        session_id: String,
        agent: String,
        timestamp: Instant,
    },
    StepCompleted {
        session_id: String,
        agent: String,
        duration_ms: u64,
        timestamp: Instant,
    },
    StepTimedOut {
        session_id: String,
        agent: String,
        timeout_ms: u64,
        timestamp: Instant,
    },
}

/// Aggregated telemetry counters
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub sessions_started: usize,
    pub sessions_completed: usize,
    pub sessions_failed: usize,
    pub sessions_cancelled: usize,
    pub steps_started: usize,
    pub steps_completed: usize,
    pub steps_timed_out: usize,
}

/// Telemetry collector shared across concurrent sessions
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: SessionEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                SessionEvent::SessionStarted { .. } => stats.sessions_started += 1,
                SessionEvent::SessionCompleted { .. } => stats.sessions_completed += 1,
                SessionEvent::SessionFailed { .. } => stats.sessions_failed += 1,
                SessionEvent::SessionCancelled { .. } => stats.sessions_cancelled += 1,
                SessionEvent::StepStarted { .. } => stats.steps_started += 1,
                SessionEvent::StepCompleted { .. } => stats.steps_completed += 1,
                SessionEvent::StepTimedOut { .. } => stats.steps_timed_out += 1,
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Get elapsed time since the collector was created
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Get the last n events
    pub fn recent_events(&self, n: usize) -> Vec<SessionEvent> {
        let Ok(events) = self.events.lock() else {
            return Vec::new();
        };
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Fraction of started sessions that completed; 1 before any finish
    pub fn session_success_rate(&self) -> f64 {
        let stats = self.get_stats();
        let finished = stats.sessions_completed + stats.sessions_failed;
        if finished == 0 {
            1.0
        } else {
            stats.sessions_completed as f64 / finished as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: &str) -> SessionEvent {
        SessionEvent::SessionStarted {
            session_id: id.to_string(),
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_records_events_and_stats() {
        let collector = TelemetryCollector::new();

        collector.record(started("s1"));
        collector.record(SessionEvent::StepStarted {
            session_id: "s1".to_string(),
            agent: "brain-agent".to_string(),
            timestamp: Instant::now(),
        });
        collector.record(SessionEvent::StepTimedOut {
            session_id: "s1".to_string(),
            agent: "brain-agent".to_string(),
            timeout_ms: 20_000,
            timestamp: Instant::now(),
        });
        collector.record(SessionEvent::SessionFailed {
            session_id: "s1".to_string(),
            reason: "timeout".to_string(),
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.steps_timed_out, 1);
        assert_eq!(stats.sessions_failed, 1);
        assert_eq!(collector.event_count(), 4);
    }

    #[test]
    fn test_recent_events_window() {
        let collector = TelemetryCollector::new();
        for i in 0..10 {
            collector.record(started(&format!("s{}", i)));
        }

        assert_eq!(collector.recent_events(3).len(), 3);
        assert_eq!(collector.recent_events(100).len(), 10);
    }

    #[test]
    fn test_success_rate() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.session_success_rate(), 1.0);

        collector.record(SessionEvent::SessionCompleted {
            session_id: "s1".to_string(),
            message_count: 4,
            timestamp: Instant::now(),
        });
        collector.record(SessionEvent::SessionFailed {
            session_id: "s2".to_string(),
            reason: "cancelled".to_string(),
            timestamp: Instant::now(),
        });

        assert!((collector.session_success_rate() - 0.5).abs() < f64::EPSILON);
    }
}
