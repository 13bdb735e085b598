//! Capability traits at the I/O seams.
//!
//! The supervisor and session depend only on these traits.  Production
//! implementations live in `infrastructure::http` and
//! `infrastructure::output`; tests substitute mocks.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use serialconsole_core::{AdminCommand, EndpointError};

// ── Error types ───────────────────────────────────────────────────────────────

/// A connection attempt failed before the console stream became usable.
///
/// Every variant is recoverable: the user is told to press Enter and a fresh
/// attempt starts from scratch.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The connect request could not be sent or its body not read.
    #[error("connect request failed: {0}")]
    Transport(String),

    /// The connect endpoint answered with something other than 200.
    #[error("connect endpoint returned HTTP {0}")]
    Status(u16),

    /// A 200 response without a usable `connectionString`.
    #[error("malformed connect response: {0}")]
    MalformedBody(String),

    /// The websocket handshake failed.
    #[error("failed to open websocket: {0}")]
    SocketOpen(String),

    /// Negotiation plus handshake did not finish in time.
    #[error("connection attempt timed out after {0:?}")]
    TimedOut(Duration),
}

/// An admin command could not be delivered.  Never shown to the user.
#[derive(Debug, Error)]
pub enum AdminCommandError {
    /// The admin endpoint could not be derived from the websocket URL.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// The HTTP request failed.
    #[error("admin command request failed: {0}")]
    Transport(String),

    /// The endpoint rejected the command.
    #[error("admin command endpoint returned HTTP {0}")]
    Status(u16),
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Resolves the websocket URL for a new attachment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionNegotiator: Send + Sync {
    /// Performs the connect request and returns the `connectionString`
    /// (without the authorization parameter).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] on transport failure, a non-200 status, or a
    /// malformed body.
    async fn negotiate(&self) -> Result<String, ConnectError>;
}

/// Delivers admin commands for an open attachment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminCommandSender: Send + Sync {
    /// Sends `command` to the admin endpoint derived from `connection_string`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminCommandError`]; callers log and drop it.
    async fn send(&self, connection_string: &str, command: AdminCommand) -> Result<(), AdminCommandError>;
}

/// The local terminal's output side.
///
/// Writes are best effort: a failing stdout must not take the session down.
pub trait ConsoleOutput: Send + Sync {
    /// Writes `bytes` verbatim and flushes.
    fn write(&self, bytes: &[u8]);

    /// Writes `message` on a line of its own.
    ///
    /// Raw mode disables output post-processing, so line breaks are spelled
    /// out as `\r\n`.
    fn status_line(&self, message: &str) {
        self.write(format!("\r\n{message}\r\n").as_bytes());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
