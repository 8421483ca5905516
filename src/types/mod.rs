//! Type definitions module
//!
//! Core types for the session data model and thread messaging.

pub mod messages;
pub mod session;

// Re-export commonly used types
pub use messages::{ActionDecision, AgentReply, MessageType, RiskAssessment, ThreadMessage, SYSTEM_SENDER};
pub use session::{Priority, SessionMetadata, SessionMetrics, SessionStatus, SessionType, ThreadSession};
