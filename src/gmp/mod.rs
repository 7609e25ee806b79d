//! GMP socket client.
//!
//! The scanner manager listens on a Unix domain socket and answers one XML
//! reply per XML command. Connections are cheap and stateful (authentication
//! is per-connection), so the gateway opens a fresh one for every forwarded
//! request, authenticates as the caller and sends a single command.

pub mod classify;
pub mod handshake;

use anyhow::{bail, Context, Result};
use quick_xml::escape::escape;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

/// Default control socket of the scanner manager.
pub const DEFAULT_SOCKET_PATH: &str = "/run/gvmd/gvmd.sock";

/// Bound on a single connect or command round-trip, so one hung attempt
/// cannot eat the handshake retry budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection factory for the manager's control socket.
#[derive(Debug, Clone)]
pub struct GmpClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl GmpClient {
    #[must_use]
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    /// Open a fresh connection to the control socket.
    ///
    /// # Errors
    /// Returns an error when the socket is absent, refuses the connection or
    /// does not accept it within the timeout.
    pub async fn connect(&self) -> Result<GmpConnection> {
        let stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .with_context(|| format!("Timed out connecting to {}", self.socket_path.display()))?
            .with_context(|| format!("Failed to connect to {}", self.socket_path.display()))?;

        Ok(GmpConnection {
            stream,
            timeout: self.timeout,
        })
    }
}

/// A single connection to the manager. One command, one reply.
pub struct GmpConnection {
    stream: UnixStream,
    timeout: Duration,
}

impl GmpConnection {
    /// Send one command and read the complete XML reply.
    ///
    /// The reply is streamed; reading stops as soon as the accumulated bytes
    /// form one complete document, bounded by the connection timeout.
    ///
    /// # Errors
    /// Returns an error on socket failure or timeout.
    pub async fn request(&mut self, command: &str) -> Result<String> {
        debug!("GMP command: {command}");

        timeout(self.timeout, self.exchange(command))
            .await
            .context("Backend request timed out")?
    }

    /// Authenticate the connection on behalf of a gateway user.
    ///
    /// # Errors
    /// Returns an error when the manager rejects the credentials or the
    /// exchange fails.
    pub async fn authenticate(&mut self, username: &str, password: &SecretString) -> Result<()> {
        let command = format!(
            "<authenticate><credentials><username>{}</username><password>{}</password></credentials></authenticate>",
            escape(username),
            escape(password.expose_secret()),
        );

        let reply = self.request(&command).await?;
        let classified = classify::classify(&reply);

        if !classified.is_success() {
            bail!(
                "Backend rejected credentials for '{}': status {}",
                username,
                classified.status
            );
        }

        Ok(())
    }

    async fn exchange(&mut self, command: &str) -> Result<String> {
        self.stream.write_all(command.as_bytes()).await?;

        let mut reply = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }

            reply.extend_from_slice(&chunk[..n]);

            if let Ok(text) = std::str::from_utf8(&reply) {
                if classify::is_complete_document(text) {
                    return Ok(text.to_string());
                }
            }
        }

        // Peer closed before a complete document; let the classifier decide.
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }
}
