//! RUSH Orchestrator - Multi-Agent Session Engine
//!
//! Session orchestration core for a voice-driven Web3 support and
//! payment system. Takes a single user utterance and drives it through
//! a fixed pipeline of cooperating agents (voice transcription, intent
//! analysis, fraud screening, blockchain execution) over a thread-based
//! message-passing transport, producing a terminal session outcome with
//! derived metrics.
//!
//! # Architecture
//!
//! - `orchestrator`: session lifecycle and the conditional pipeline
//! - `registry`: shared session store with bounded retention + analytics
//! - `transport`: the external thread-transport contract (consumed only)
//! - `directory`: agent identities, capabilities, and liveness

pub mod errors;
pub mod types;
pub mod classify;
pub mod config;
pub mod directory;
pub mod transport;
pub mod registry;
pub mod orchestrator;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{OrchestratorError, Result};
pub use config::OrchestratorConfig;
pub use orchestrator::SessionOrchestrator;
pub use registry::{SessionAnalytics, SessionRegistry};
pub use transport::{ThreadTransport, TransportMessage};
pub use types::{
    AgentReply, MessageType, Priority, SessionMetadata, SessionMetrics, SessionStatus,
    SessionType, ThreadMessage, ThreadSession,
};
