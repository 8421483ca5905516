//! Session orchestrator - core pipeline engine
//!
//! Drives one user utterance through the fixed agent pipeline over the
//! thread transport:
//!
//! 1. voice listener (transcription)           - always, T1
//! 2. brain (intent analysis)                  - always, T2
//! 3. fraud detector                           - if screening triggered, T3
//! 4. executor (blockchain action)             - if required and not rejected, T4
//!
//! Steps run strictly in sequence; each step is one send-then-wait
//! exchange. Any timeout or transport failure is fatal to the session:
//! it is absorbed into a trailing error message and a `Failed` status,
//! never propagated to the caller. Only the initial connection failure
//! escapes as a hard error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::classify;
use crate::config::OrchestratorConfig;
use crate::directory::{
    AgentDirectory, BRAIN_AGENT, EXECUTOR_AGENT, FRAUD_DETECTION_AGENT, VOICE_LISTENER_AGENT,
};
use crate::errors::{OrchestratorError, Result};
use crate::registry::{SessionAnalytics, SessionHandle, SessionRegistry};
use crate::telemetry::{SessionEvent, TelemetryCollector};
use crate::transport::{ConnectionRetry, ThreadTransport};
use crate::types::messages::{AgentReply, MessageType, ThreadMessage};
use crate::types::session::{SessionMetrics, ThreadSession};

/// Main session orchestrator
pub struct SessionOrchestrator {
    /// Thread transport, connected at construction
    transport: Arc<dyn ThreadTransport>,

    /// Shared session store
    registry: Arc<SessionRegistry>,

    /// Timeouts and retry settings
    config: OrchestratorConfig,

    /// Optional event collector
    telemetry: Option<TelemetryCollector>,
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionOrchestrator {
    /// Connect to the thread transport and build the orchestrator.
    ///
    /// The connection is attempted under the bounded retry policy from
    /// the config; exhaustion returns `ConnectionFailed`, the one error
    /// this crate treats as unrecoverable.
    pub async fn connect(
        transport: Arc<dyn ThreadTransport>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let retry = ConnectionRetry::from_config(&config.connection);
        if config.verbose {
            eprintln!(
                "[TRANSPORT] Connecting (up to {} attempts, max wait {:?})",
                retry.max_attempts(),
                retry.max_total_wait()
            );
        }
        retry.connect(transport.as_ref()).await?;

        if config.verbose {
            eprintln!("[TRANSPORT] Connected");
        }

        let registry = Arc::new(SessionRegistry::new(config.registry.history_capacity));

        Ok(Self {
            transport,
            registry,
            config,
            telemetry: None,
        })
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, collector: TelemetryCollector) -> Self {
        self.telemetry = Some(collector);
        self
    }

    /// Shared session registry
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run one end-to-end support session.
    ///
    /// Registers the session exactly once, executes the pipeline, and
    /// returns the finalized record; its status is the authoritative
    /// success signal. Duplicate session ids are rejected up front.
    pub async fn start_support_session(
        &self,
        user_query: &str,
        session_id: &str,
    ) -> Result<ThreadSession> {
        let metadata = classify::classify(user_query);
        let participants = AgentDirectory::pipeline_participants();
        let session = ThreadSession::new(session_id, participants, metadata);

        // Registered before any transport call so the session lands in
        // the registry no matter how the pipeline ends.
        let handle = self.registry.insert(session)?;

        self.emit(SessionEvent::SessionStarted {
            session_id: session_id.to_string(),
            timestamp: Instant::now(),
        });
        if self.config.verbose {
            eprintln!("[SESSION] {} started: {}", session_id, user_query);
        }

        match self.run_pipeline(&handle, user_query).await {
            Ok(()) => {
                let message_count = {
                    let mut session = self.write_session(&handle)?;
                    session.complete();
                    session.messages.len()
                };

                self.emit(SessionEvent::SessionCompleted {
                    session_id: session_id.to_string(),
                    message_count,
                    timestamp: Instant::now(),
                });
                if self.config.verbose {
                    eprintln!("[SESSION] {} completed ({} messages)", session_id, message_count);
                }
            }
            Err(OrchestratorError::Cancelled(_)) => {
                // cancel_session already finalized the record and
                // appended the coordination message.
                if self.config.verbose {
                    eprintln!("[SESSION] {} cancelled mid-pipeline", session_id);
                }
            }
            Err(e) => {
                let label = if e.is_timeout() {
                    "Agent deadline exceeded"
                } else {
                    "Pipeline step failed"
                };
                {
                    let mut session = self.write_session(&handle)?;
                    session.push_message(ThreadMessage::system(
                        format!("{}: {}", label, e),
                        MessageType::Error,
                    ));
                    session.fail();
                }

                self.emit(SessionEvent::SessionFailed {
                    session_id: session_id.to_string(),
                    reason: e.to_string(),
                    timestamp: Instant::now(),
                });
                if self.config.verbose {
                    eprintln!("[SESSION] {} failed: {}", session_id, e);
                }
            }
        }

        self.registry
            .snapshot(session_id)
            .ok_or_else(|| OrchestratorError::Generic(format!("session {} missing from registry", session_id)))
    }

    /// Cancel an active session.
    ///
    /// Idempotent: unknown or already-terminal sessions return false
    /// with no state change. Otherwise the session fails, every current
    /// participant is notified with a coordination broadcast, and the
    /// in-flight pipeline wait observes the cancellation signal.
    pub async fn cancel_session(&self, session_id: &str) -> bool {
        let Some(handle) = self.registry.get(session_id) else {
            return false;
        };

        let (thread_id, participants) = {
            let Ok(mut session) = handle.session.write() else {
                return false;
            };
            if session.is_terminal() {
                return false;
            }

            session.push_message(ThreadMessage::system(
                "Session cancelled by user",
                MessageType::Coordination,
            ));
            session.fail();
            (session.thread_id.clone(), session.participants.clone())
        };

        // Wake the in-flight wait, if any. send_replace updates the
        // value even when nothing is currently subscribed.
        handle.cancel.send_replace(true);

        self.emit(SessionEvent::SessionCancelled {
            session_id: session_id.to_string(),
            timestamp: Instant::now(),
        });
        if self.config.verbose {
            eprintln!("[SESSION] {} cancelled", session_id);
        }

        // Best effort: the session is already failed either way
        if let Some(thread_id) = thread_id {
            if let Err(e) = self
                .transport
                .send_message(&thread_id, "Session cancelled by user", &participants)
                .await
            {
                if self.config.verbose {
                    eprintln!("[CANCEL] broadcast to {} failed: {}", session_id, e);
                }
            }
        }

        true
    }

    /// Add a participant to an active session and its thread.
    ///
    /// Returns false for unknown or terminal sessions.
    pub async fn add_participant(&self, session_id: &str, agent_id: &str) -> bool {
        let Some(handle) = self.registry.get(session_id) else {
            return false;
        };

        let thread_id = {
            let Ok(mut session) = handle.session.write() else {
                return false;
            };
            if !session.add_participant(agent_id) {
                return false;
            }
            session.thread_id.clone()
        };

        if let Some(thread_id) = thread_id {
            if let Err(e) = self.transport.add_participant(&thread_id, agent_id).await {
                if self.config.verbose {
                    eprintln!("[SESSION] {} participant propagation failed: {}", session_id, e);
                }
            }
        }

        true
    }

    /// Derived metrics for one session; None if unknown
    pub fn get_session_metrics(&self, session_id: &str) -> Option<SessionMetrics> {
        self.registry.get_session_metrics(session_id)
    }

    /// Sessions still running
    pub fn get_active_sessions(&self) -> Vec<ThreadSession> {
        self.registry.get_active_sessions()
    }

    /// Most recent sessions, newest first
    pub fn get_session_history(&self, limit: usize) -> Vec<ThreadSession> {
        self.registry.get_session_history(limit)
    }

    /// Cross-session aggregates
    pub fn get_analytics(&self) -> SessionAnalytics {
        self.registry.get_analytics()
    }

    // ------------------------------------------------------------------
    // Pipeline internals
    // ------------------------------------------------------------------

    async fn run_pipeline(&self, handle: &SessionHandle, user_query: &str) -> Result<()> {
        let participants = {
            let session = self.read_session(handle)?;
            session.participants.clone()
        };

        let thread_id = self
            .transport
            .create_thread(&format!("session-{}", handle.id), &participants)
            .await?;
        {
            let mut session = self.write_session(handle)?;
            session.assign_thread(&thread_id);
        }

        // Step 1: transcription
        let voice_reply = self
            .run_step(
                handle,
                &thread_id,
                VOICE_LISTENER_AGENT,
                user_query,
                self.config.timeouts.voice(),
            )
            .await?;

        // Step 2: intent analysis
        let brain_reply = self
            .run_step(
                handle,
                &thread_id,
                BRAIN_AGENT,
                &voice_reply.content,
                self.config.timeouts.brain(),
            )
            .await?;

        // Step 3: fraud screening, on query keywords or elevated risk
        if classify::requires_fraud_detection(user_query, brain_reply.risk_score()) {
            self.run_step(
                handle,
                &thread_id,
                FRAUD_DETECTION_AGENT,
                &brain_reply.content,
                self.config.timeouts.fraud(),
            )
            .await?;
        }

        // Step 4: execution, only when declared needed and not rejected
        if classify::requires_blockchain_action(brain_reply.action) {
            self.run_step(
                handle,
                &thread_id,
                EXECUTOR_AGENT,
                &brain_reply.content,
                self.config.timeouts.executor(),
            )
            .await?;
        }

        Ok(())
    }

    /// One pipeline step: post a request addressed to `agent`, then wait
    /// for the addressed reply within `bound`.
    ///
    /// The wait races the transport against both the step bound and the
    /// session's cancellation signal, so a cancelled session unwinds
    /// without leaking a pending wait and late replies are discarded.
    async fn run_step(
        &self,
        handle: &SessionHandle,
        thread_id: &str,
        agent: &str,
        payload: &str,
        bound: Duration,
    ) -> Result<AgentReply> {
        if handle.is_cancelled() {
            return Err(OrchestratorError::Cancelled(handle.id.clone()));
        }

        self.emit(SessionEvent::StepStarted {
            session_id: handle.id.clone(),
            agent: agent.to_string(),
            timestamp: Instant::now(),
        });
        if self.config.verbose {
            eprintln!("[STEP] {} -> {}", handle.id, agent);
        }

        self.append(handle, ThreadMessage::system(payload, MessageType::Request))?;

        self.transport
            .send_message(thread_id, payload, &[agent.to_string()])
            .await?;

        let started = Instant::now();
        let mut cancel_rx = handle.cancel.subscribe();

        let waited = tokio::select! {
            res = timeout(bound, self.transport.wait_for_mentions(thread_id, bound)) => {
                match res {
                    Ok(inner) => inner,
                    // The transport overran its own bound; treat as timeout
                    Err(_) => Ok(None),
                }
            }
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                return Err(OrchestratorError::Cancelled(handle.id.clone()));
            }
        };

        match waited {
            Ok(Some(message)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.emit(SessionEvent::StepCompleted {
                    session_id: handle.id.clone(),
                    agent: agent.to_string(),
                    duration_ms,
                    timestamp: Instant::now(),
                });
                if self.config.verbose {
                    eprintln!("[STEP] {} <- {} ({}ms)", handle.id, agent, duration_ms);
                }

                let reply = AgentReply::from_content(&message.content);
                self.append(
                    handle,
                    ThreadMessage::new(agent, message.content, MessageType::Response),
                )?;
                Ok(reply)
            }
            Ok(None) => {
                let timeout_ms = bound.as_millis() as u64;
                self.emit(SessionEvent::StepTimedOut {
                    session_id: handle.id.clone(),
                    agent: agent.to_string(),
                    timeout_ms,
                    timestamp: Instant::now(),
                });
                Err(OrchestratorError::Timeout {
                    agent: agent.to_string(),
                    duration_ms: timeout_ms,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Append to the session trail. A terminal session (cancelled from
    /// outside while the step was in flight) rejects the append, which
    /// stops the pipeline.
    fn append(&self, handle: &SessionHandle, message: ThreadMessage) -> Result<()> {
        let mut session = self.write_session(handle)?;
        if !session.push_message(message) {
            return Err(OrchestratorError::Cancelled(handle.id.clone()));
        }
        Ok(())
    }

    fn write_session<'a>(
        &self,
        handle: &'a SessionHandle,
    ) -> Result<std::sync::RwLockWriteGuard<'a, ThreadSession>> {
        handle
            .session
            .write()
            .map_err(|e| OrchestratorError::Lock(e.to_string()))
    }

    fn read_session<'a>(
        &self,
        handle: &'a SessionHandle,
    ) -> Result<std::sync::RwLockReadGuard<'a, ThreadSession>> {
        handle
            .session
            .read()
            .map_err(|e| OrchestratorError::Lock(e.to_string()))
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }
}
