//! Bounded startup retry
//!
//! Retries the initial transport connection a fixed number of times with
//! a fixed inter-attempt delay. Exhaustion surfaces as the fatal
//! `ConnectionFailed` error; this loop never applies to individual
//! pipeline steps.

use crate::config::ConnectionConfig;
use crate::errors::{OrchestratorError, Result};
use crate::transport::ThreadTransport;
use std::time::Duration;
use tokio::time::sleep;

/// Default maximum number of connection attempts
pub const MAX_ATTEMPTS: u32 = 5;

/// Default fixed delay between attempts (2 seconds)
const DEFAULT_DELAY_MS: u64 = 2_000;

/// Fixed-delay bounded retry for the initial transport connection
#[derive(Debug, Clone)]
pub struct ConnectionRetry {
    /// Maximum connection attempts
    max_attempts: u32,

    /// Fixed delay between attempts
    delay: Duration,
}

impl Default for ConnectionRetry {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, DEFAULT_DELAY_MS)
    }
}

impl ConnectionRetry {
    /// Create a retry policy with explicit bounds
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Build the policy from the connection config section
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay_ms)
    }

    /// Attempt to connect, retrying transient failures up to the bound.
    ///
    /// Returns `ConnectionFailed` carrying the attempt count and the last
    /// underlying error once the bound is exhausted.
    pub async fn connect<T: ThreadTransport + ?Sized>(&self, transport: &T) -> Result<()> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match transport.connect().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if !self.is_retryable(&e) || attempt >= self.max_attempts {
                        return Err(OrchestratorError::ConnectionFailed {
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    sleep(self.delay).await;
                }
            }
        }
    }

    /// Total worst-case wait across all sleeps
    pub fn max_total_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }

    /// Get max attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check if a connection error is worth retrying
    fn is_retryable(&self, error: &OrchestratorError) -> bool {
        match error {
            // Transient transport conditions
            OrchestratorError::Transport(_) => true,
            OrchestratorError::Timeout { .. } => true,
            OrchestratorError::Generic(_) => true,

            // Permanent conditions
            OrchestratorError::Config(_) => false,
            OrchestratorError::Serialization(_) => false,

            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport stub that fails a fixed number of connects
    struct FlakyTransport {
        fail_first: u32,
        attempts: AtomicU32,
        permanent: bool,
    }

    impl FlakyTransport {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                attempts: AtomicU32::new(0),
                permanent: false,
            }
        }
    }

    #[async_trait]
    impl ThreadTransport for FlakyTransport {
        async fn connect(&self) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.fail_first {
                if self.permanent {
                    Err(OrchestratorError::Config("bad endpoint".to_string()))
                } else {
                    Err(OrchestratorError::Transport("refused".to_string()))
                }
            } else {
                Ok(())
            }
        }

        async fn create_thread(&self, _name: &str, _participants: &[String]) -> Result<String> {
            unimplemented!("connection-only stub")
        }

        async fn send_message(
            &self,
            _thread_id: &str,
            _content: &str,
            _mentions: &[String],
        ) -> Result<TransportMessage> {
            unimplemented!("connection-only stub")
        }

        async fn wait_for_mentions(
            &self,
            _thread_id: &str,
            _timeout: Duration,
        ) -> Result<Option<TransportMessage>> {
            unimplemented!("connection-only stub")
        }

        async fn add_participant(&self, _thread_id: &str, _agent_id: &str) -> Result<bool> {
            unimplemented!("connection-only stub")
        }
    }

    #[tokio::test]
    async fn test_connect_first_attempt() {
        let transport = FlakyTransport::new(0);
        let retry = ConnectionRetry::new(5, 1);

        retry.connect(&transport).await.unwrap();
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_after_transient_failures() {
        let transport = FlakyTransport::new(3);
        let retry = ConnectionRetry::new(5, 1);

        retry.connect(&transport).await.unwrap();
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_connect_exhaustion_is_fatal() {
        let transport = FlakyTransport::new(u32::MAX);
        let retry = ConnectionRetry::new(3, 1);

        let err = retry.connect(&transport).await.unwrap_err();
        match err {
            OrchestratorError::ConnectionFailed { attempts, reason } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("refused"));
            }
            other => panic!("expected ConnectionFailed, got {other:?}"),
        }
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_short_circuits() {
        let transport = FlakyTransport {
            fail_first: u32::MAX,
            attempts: AtomicU32::new(0),
            permanent: true,
        };
        let retry = ConnectionRetry::new(5, 1);

        let err = retry.connect(&transport).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ConnectionFailed { attempts: 1, .. }));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_max_total_wait_is_fixed_delay() {
        let retry = ConnectionRetry::new(5, 2_000);
        assert_eq!(retry.max_total_wait(), Duration::from_secs(8));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let retry = ConnectionRetry::new(0, 10);
        assert_eq!(retry.max_attempts(), 1);
    }
}
