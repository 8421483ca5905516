//! Agent directory
//!
//! Registry of agent identities reachable through the thread transport:
//! id, display name, capability tags, and liveness status. Read-only to
//! the orchestrator; the pipeline only consumes the default roster ids.
//!
//! Default roster:
//! - voice-listener-agent: speech capture and transcription
//! - brain-agent: intent analysis and response formulation
//! - fraud-detection-agent: risk assessment and fraud screening
//! - executor-agent: blockchain interaction and transaction execution
//! - payment-agent: cross-border payment processing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known agent ids used by the session pipeline
pub const VOICE_LISTENER_AGENT: &str = "voice-listener-agent";
pub const BRAIN_AGENT: &str = "brain-agent";
pub const FRAUD_DETECTION_AGENT: &str = "fraud-detection-agent";
pub const EXECUTOR_AGENT: &str = "executor-agent";
pub const PAYMENT_AGENT: &str = "payment-agent";

/// Agent liveness status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
    Busy,
}

/// One registered agent identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Stable agent id
    pub id: String,

    /// Human-readable display name
    pub name: String,

    /// Capability tags for discovery
    pub capabilities: Vec<String>,

    /// Liveness status
    pub status: AgentStatus,

    /// Last heartbeat, if the agent has reported one
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl AgentInfo {
    /// Create an active agent with the given capabilities
    pub fn new(id: impl Into<String>, name: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            status: AgentStatus::Active,
            last_heartbeat: None,
        }
    }

    /// True if the agent advertises the given capability
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Agent directory with the default pipeline roster
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    /// Map of agent id to identity
    agents: HashMap<String, AgentInfo>,
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentDirectory {
    /// Create a directory pre-populated with the default roster
    pub fn new() -> Self {
        let mut directory = Self {
            agents: HashMap::new(),
        };

        directory.register(AgentInfo::new(
            VOICE_LISTENER_AGENT,
            "Voice Listener Agent",
            &["speech-to-text", "text-to-speech", "voice-processing"],
        ));
        directory.register(AgentInfo::new(
            BRAIN_AGENT,
            "Brain Agent",
            &[
                "natural-language-understanding",
                "intent-analysis",
                "response-generation",
            ],
        ));
        directory.register(AgentInfo::new(
            FRAUD_DETECTION_AGENT,
            "Fraud Detection Agent",
            &["fraud-detection", "risk-assessment", "pattern-analysis"],
        ));
        directory.register(AgentInfo::new(
            EXECUTOR_AGENT,
            "Executor Agent",
            &[
                "blockchain-interaction",
                "nft-minting",
                "transaction-verification",
            ],
        ));
        directory.register(AgentInfo::new(
            PAYMENT_AGENT,
            "Payment Agent",
            &[
                "cross-border-payments",
                "sub-second-settlement",
                "multi-currency-support",
            ],
        ));

        directory
    }

    /// Create an empty directory
    pub fn empty() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Register or replace an agent identity
    pub fn register(&mut self, agent: AgentInfo) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Remove an agent. Returns false if unknown.
    pub fn unregister(&mut self, agent_id: &str) -> bool {
        self.agents.remove(agent_id).is_some()
    }

    /// Look up an agent by id
    pub fn get(&self, agent_id: &str) -> Option<&AgentInfo> {
        self.agents.get(agent_id)
    }

    /// All registered agents
    pub fn agents(&self) -> impl Iterator<Item = &AgentInfo> {
        self.agents.values()
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when no agents are registered
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents advertising the given capability
    pub fn find_by_capability(&self, capability: &str) -> Vec<&AgentInfo> {
        self.agents
            .values()
            .filter(|a| a.has_capability(capability))
            .collect()
    }

    /// Update an agent's status. Returns false if unknown.
    pub fn set_status(&mut self, agent_id: &str, status: AgentStatus) -> bool {
        match self.agents.get_mut(agent_id) {
            Some(agent) => {
                agent.status = status;
                true
            }
            None => false,
        }
    }

    /// Record a heartbeat for an agent. Returns false if unknown.
    pub fn record_heartbeat(&mut self, agent_id: &str) -> bool {
        match self.agents.get_mut(agent_id) {
            Some(agent) => {
                agent.last_heartbeat = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Count of agents per status bucket
    pub fn status_counts(&self) -> HashMap<AgentStatus, usize> {
        let mut counts = HashMap::new();
        for agent in self.agents.values() {
            *counts.entry(agent.status).or_insert(0) += 1;
        }
        counts
    }

    /// The fixed participant roster for a new support session
    pub fn pipeline_participants() -> Vec<String> {
        vec![
            VOICE_LISTENER_AGENT.to_string(),
            BRAIN_AGENT.to_string(),
            EXECUTOR_AGENT.to_string(),
            FRAUD_DETECTION_AGENT.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let directory = AgentDirectory::new();
        assert_eq!(directory.len(), 5);
        assert!(directory.get(VOICE_LISTENER_AGENT).is_some());
        assert!(directory.get(BRAIN_AGENT).is_some());
        assert!(directory.get(FRAUD_DETECTION_AGENT).is_some());
        assert!(directory.get(EXECUTOR_AGENT).is_some());
        assert!(directory.get(PAYMENT_AGENT).is_some());
    }

    #[test]
    fn test_capability_discovery() {
        let directory = AgentDirectory::new();

        let screeners = directory.find_by_capability("fraud-detection");
        assert_eq!(screeners.len(), 1);
        assert_eq!(screeners[0].id, FRAUD_DETECTION_AGENT);

        assert!(directory.find_by_capability("quantum-routing").is_empty());
    }

    #[test]
    fn test_status_update() {
        let mut directory = AgentDirectory::new();
        assert!(directory.set_status(BRAIN_AGENT, AgentStatus::Busy));
        assert_eq!(directory.get(BRAIN_AGENT).unwrap().status, AgentStatus::Busy);

        assert!(!directory.set_status("ghost-agent", AgentStatus::Inactive));
    }

    #[test]
    fn test_heartbeat_recording() {
        let mut directory = AgentDirectory::new();
        assert!(directory.get(EXECUTOR_AGENT).unwrap().last_heartbeat.is_none());
        assert!(directory.record_heartbeat(EXECUTOR_AGENT));
        assert!(directory.get(EXECUTOR_AGENT).unwrap().last_heartbeat.is_some());
        assert!(!directory.record_heartbeat("ghost-agent"));
    }

    #[test]
    fn test_pipeline_participants_are_registered() {
        let directory = AgentDirectory::new();
        for id in AgentDirectory::pipeline_participants() {
            assert!(directory.get(&id).is_some(), "missing {}", id);
        }
    }

    #[test]
    fn test_status_counts() {
        let mut directory = AgentDirectory::new();
        directory.set_status(PAYMENT_AGENT, AgentStatus::Inactive);
        let counts = directory.status_counts();
        assert_eq!(counts.get(&AgentStatus::Active), Some(&4));
        assert_eq!(counts.get(&AgentStatus::Inactive), Some(&1));
    }
}
