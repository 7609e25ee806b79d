//! Startup liveness handshake.
//!
//! The gateway is useless without its backend, so startup blocks until the
//! manager answers a version probe: connect, send `<get_version/>`, classify
//! the reply. Connection failures are transient and retried with a fixed
//! backoff up to a ceiling; a reachable backend that reports a non-success
//! status is a configuration problem and fails immediately. Both outcomes
//! terminate the process with distinct exit codes so deployment tooling can
//! tell them apart. Once ready, the handshake never re-runs; later backend
//! trouble surfaces per request through the forwarding layer.

use crate::gmp::classify;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Exit code for a socket that never became reachable.
pub const EXIT_BACKEND_UNREACHABLE: i32 = 2;

/// Exit code for a reachable backend whose handshake reply was unhealthy.
pub const EXIT_BACKEND_UNHEALTHY: i32 = 3;

/// Default attempt ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

const BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("Backend socket unreachable after {attempts} attempt(s)")]
    Unreachable { attempts: u32 },

    #[error("Backend reachable but handshake reported status {status}")]
    Unhealthy {
        status: u16,
        status_text: Option<String>,
    },
}

impl HandshakeError {
    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } => EXIT_BACKEND_UNREACHABLE,
            Self::Unhealthy { .. } => EXIT_BACKEND_UNHEALTHY,
        }
    }
}

/// The startup retry loop: probe until a connection succeeds, then judge
/// the backend by its first classified reply.
#[derive(Debug, Clone)]
pub struct Handshake {
    max_attempts: u32,
    backoff: Duration,
}

impl Handshake {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BACKOFF,
        }
    }

    #[cfg(test)]
    fn with_backoff(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run probes until one succeeds or the ceiling is reached.
    ///
    /// `probe` returns the raw handshake reply; any probe error counts as
    /// "unreachable" and is retried after the backoff. Returns the number of
    /// attempts used.
    ///
    /// # Errors
    /// [`HandshakeError::Unreachable`] after `max_attempts` failed probes;
    /// [`HandshakeError::Unhealthy`] as soon as a probe connects but its
    /// classified status is not a success. Unhealthy is never retried.
    pub async fn run<P, F>(&self, mut probe: P) -> Result<u32, HandshakeError>
    where
        P: FnMut() -> F,
        F: Future<Output = anyhow::Result<String>>,
    {
        for attempt in 1..=self.max_attempts {
            match probe().await {
                Ok(raw) => {
                    let classified = classify::classify(&raw);

                    if classified.is_success() {
                        info!("Backend ready after {attempt} attempt(s)");

                        return Ok(attempt);
                    }

                    return Err(HandshakeError::Unhealthy {
                        status: classified.status,
                        status_text: classified.status_text,
                    });
                }

                Err(e) => {
                    warn!(
                        "Backend probe {attempt}/{} failed: {e}",
                        self.max_attempts
                    );

                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        Err(HandshakeError::Unreachable {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_ready_on_healthy_reply() {
        let handshake = Handshake::with_backoff(60, Duration::ZERO);

        let attempts = handshake
            .run(|| async { Ok(r#"<version_response status="200" status_text="OK"/>"#.to_string()) })
            .await
            .unwrap();

        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_until_ceiling() {
        let handshake = Handshake::with_backoff(60, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let err = handshake
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(anyhow!("connection refused")) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 60);
        assert_eq!(err, HandshakeError::Unreachable { attempts: 60 });
        assert_eq!(err.exit_code(), EXIT_BACKEND_UNREACHABLE);
    }

    #[tokio::test]
    async fn test_unhealthy_reply_is_fatal_without_retry() {
        let handshake = Handshake::with_backoff(60, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let err = handshake
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(r#"<version_response status="500" status_text="down"/>"#.to_string()) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            err,
            HandshakeError::Unhealthy {
                status: 500,
                status_text: Some("down".to_string()),
            }
        );
        assert_eq!(err.exit_code(), EXIT_BACKEND_UNHEALTHY);
    }

    #[tokio::test]
    async fn test_unclassifiable_reply_is_unhealthy() {
        let handshake = Handshake::with_backoff(60, Duration::ZERO);

        let err = handshake
            .run(|| async { Ok("garbage".to_string()) })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            HandshakeError::Unhealthy {
                status: classify::DEFAULT_ERROR_STATUS,
                status_text: None,
            }
        );
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let handshake = Handshake::with_backoff(10, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let attempts = handshake
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(anyhow!("socket absent"))
                    } else {
                        Ok(r#"<version_response status="200" status_text="OK"/>"#.to_string())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(attempts, 4);
    }
}
