//! Error types for the session orchestrator
//!
//! Provides the crate-wide error taxonomy: fatal connection failures,
//! per-step timeouts and transport errors, and caller errors such as
//! duplicate session ids.

use thiserror::Error;

/// Main error type for the orchestration engine
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Thread transport could not be reached after retry exhaustion.
    /// This is the only error allowed to escape session execution.
    #[error("Transport connection failed after {attempts} attempts: {reason}")]
    ConnectionFailed { attempts: u32, reason: String },

    /// A pipeline step wait exceeded its bound. Kept distinct from
    /// `Transport` so the session trail can name the silent agent.
    #[error("Timed out waiting for {agent} after {duration_ms}ms")]
    Timeout { agent: String, duration_ms: u64 },

    /// Non-timeout transport failure during a pipeline step
    #[error("Transport error: {0}")]
    Transport(String),

    /// Session id already registered
    #[error("Session id already in use: {0}")]
    DuplicateSession(String),

    /// Session was cancelled while a step was in flight
    #[error("Session {0} cancelled")]
    Cancelled(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shared-state lock poisoned by a panicking holder
    #[error("Lock poisoned: {0}")]
    Lock(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("Orchestrator error: {0}")]
    Generic(String),
}

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl OrchestratorError {
    /// True for the timeout variant; the orchestrator uses this to log a
    /// timeout-specific error message into the session trail.
    pub fn is_timeout(&self) -> bool {
        matches!(self, OrchestratorError::Timeout { .. })
    }
}

/// Convert anyhow errors from the config layer
impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        OrchestratorError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_agent() {
        let err = OrchestratorError::Timeout {
            agent: "brain-agent".to_string(),
            duration_ms: 20000,
        };
        assert!(err.to_string().contains("brain-agent"));
        assert!(err.to_string().contains("20000"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_transport_error_is_not_timeout() {
        let err = OrchestratorError::Transport("connection reset".to_string());
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_duplicate_session_display() {
        let err = OrchestratorError::DuplicateSession("session_1".to_string());
        assert!(err.to_string().contains("session_1"));
    }
}
