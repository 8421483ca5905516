//! Thread transport boundary
//!
//! The orchestrator's only external interface: create a thread with a
//! participant set, post addressed messages into it, and block-wait for
//! a reply addressed back. The transport is consumed, never implemented,
//! by this crate; agents behind it are opaque collaborators.

pub mod retry;

pub use retry::ConnectionRetry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Result;

/// One message as seen by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportMessage {
    /// Transport-assigned message id
    pub id: String,

    /// Thread the message belongs to
    pub thread_id: String,

    /// Sender agent id
    pub sender: String,

    /// Opaque payload
    pub content: String,

    /// Addressed participant ids; empty means unaddressed
    pub mentions: Vec<String>,
}

/// Contract the orchestrator requires from a thread transport.
///
/// `wait_for_mentions` resolves to `Ok(None)` when the timeout elapses
/// without an addressed reply, which keeps a silent agent distinguishable
/// from a transport failure. Implementations must not block past the
/// given bound.
#[async_trait]
pub trait ThreadTransport: Send + Sync {
    /// Establish the transport connection. Called once at startup,
    /// wrapped in the bounded retry loop.
    async fn connect(&self) -> Result<()>;

    /// Create a named thread with the given participants, returning the
    /// thread handle.
    async fn create_thread(&self, name: &str, participant_ids: &[String]) -> Result<String>;

    /// Post a message into a thread, optionally addressed to specific
    /// participants.
    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        mentions: &[String],
    ) -> Result<TransportMessage>;

    /// Suspend until a reply addressed back to the caller arrives, or
    /// the timeout elapses (`Ok(None)`).
    async fn wait_for_mentions(
        &self,
        thread_id: &str,
        timeout: Duration,
    ) -> Result<Option<TransportMessage>>;

    /// Add a participant to an existing thread
    async fn add_participant(&self, thread_id: &str, agent_id: &str) -> Result<bool>;
}
