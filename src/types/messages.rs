//! Message types for thread communication
//!
//! Defines the append-only message unit exchanged over a session thread,
//! plus the narrow interface through which the orchestrator inspects
//! otherwise-opaque agent payloads (risk score and action decision).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sender sentinel for messages posted by the orchestrator itself
pub const SYSTEM_SENDER: &str = "system";

/// Kind of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Orchestrator request addressed to an agent
    Request,
    /// Agent reply addressed back to the orchestrator
    Response,
    /// Control traffic (cancellation broadcast, participant changes)
    Coordination,
    /// Step failure recorded into the session trail
    Error,
}

/// One exchanged unit within a session thread.
///
/// Messages are append-only: once pushed onto a session they are never
/// mutated or removed, and they are totally ordered by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Unique message id (UUID v4)
    pub id: String,

    /// Sender agent id, or [`SYSTEM_SENDER`] for orchestrator traffic
    pub agent: String,

    /// Opaque payload; the orchestrator never interprets its shape
    pub content: String,

    /// Append timestamp
    pub timestamp: DateTime<Utc>,

    /// Message kind
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

impl ThreadMessage {
    /// Create a new message stamped with the current time
    pub fn new(agent: impl Into<String>, content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent: agent.into(),
            content: content.into(),
            timestamp: Utc::now(),
            message_type,
        }
    }

    /// Create a message sent by the orchestrator
    pub fn system(content: impl Into<String>, message_type: MessageType) -> Self {
        Self::new(SYSTEM_SENDER, content, message_type)
    }

    /// True for error-kind messages
    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }
}

/// Risk signal extracted from an agent payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Numeric risk score; values above the routing threshold trigger
    /// the fraud-screening step
    pub score: f64,
}

/// Blockchain action signal extracted from an agent payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionDecision {
    /// The agent declared that an on-chain action is needed
    pub required: bool,
    /// Explicit approval flag; `Some(false)` vetoes execution
    pub approved: Option<bool>,
}

/// An agent response mapped into the two fields the orchestrator routes on.
///
/// Everything else in the payload stays opaque. Payloads that are not JSON,
/// or that omit the routed fields, yield a reply with no signals, which the
/// conditional steps treat as "no trigger".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentReply {
    /// Raw payload as received
    pub content: String,
    /// Risk signal, if the payload carried one
    pub risk: Option<RiskAssessment>,
    /// Action signal, if the payload carried one
    pub action: Option<ActionDecision>,
}

impl AgentReply {
    /// Probe a payload for the routed fields.
    ///
    /// Recognized shapes:
    /// - `{"risk_score": 0.9, ...}`
    /// - `{"action": {"required": true, "approved": false}, ...}`
    /// - flat `{"action_required": true, "approved": true, ...}`
    pub fn from_content(content: &str) -> Self {
        let mut reply = Self {
            content: content.to_string(),
            ..Self::default()
        };

        let value: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => return reply,
        };

        if let Some(score) = value.get("risk_score").and_then(|s| s.as_f64()) {
            reply.risk = Some(RiskAssessment { score });
        }

        if let Some(action) = value.get("action") {
            if let Some(required) = action.get("required").and_then(|r| r.as_bool()) {
                reply.action = Some(ActionDecision {
                    required,
                    approved: action.get("approved").and_then(|a| a.as_bool()),
                });
            }
        } else if let Some(required) = value.get("action_required").and_then(|r| r.as_bool()) {
            reply.action = Some(ActionDecision {
                required,
                approved: value.get("approved").and_then(|a| a.as_bool()),
            });
        }

        reply
    }

    /// Risk score with a zero default for payloads that carried none
    pub fn risk_score(&self) -> f64 {
        self.risk.map(|r| r.score).unwrap_or(0.0)
    }
}
