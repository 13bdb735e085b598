//! Console configuration.
//!
//! [`ConsoleConfig`] is the single source of truth for runtime settings.  It
//! is built once in `main.rs` from CLI arguments / environment variables and
//! then shared read-only.  The connection URL and the bearer token arrive
//! already resolved: this crate never derives credentials.

use std::fmt;
use std::time::Duration;

/// `Origin` header value the serial console service expects on connect.
pub const DEFAULT_ORIGIN: &str = "https://portal.serialconsole.azure.com";

/// All runtime configuration for one console run.
#[derive(Clone)]
pub struct ConsoleConfig {
    /// Endpoint that is POSTed to in order to obtain the websocket URL.
    pub connection_url: String,

    /// Bearer token for the connect request, the websocket `authorization`
    /// query parameter, and admin commands.
    pub access_token: String,

    /// Optional `Origin` header for the connect request.
    pub origin: Option<String>,

    /// Upper bound on one connection attempt (negotiation + websocket
    /// handshake).  Expiry counts as a failed negotiation.
    pub connect_timeout: Duration,

    /// Frame interval of the "### Opening..." animation.
    pub loading_interval: Duration,
}

impl Default for ConsoleConfig {
    /// | Field            | Default                                   |
    /// |------------------|-------------------------------------------|
    /// | connection_url   | empty                                     |
    /// | access_token     | empty                                     |
    /// | origin           | `https://portal.serialconsole.azure.com`  |
    /// | connect_timeout  | 30 seconds                                |
    /// | loading_interval | 500 ms                                    |
    fn default() -> Self {
        Self {
            connection_url: String::new(),
            access_token: String::new(),
            origin: Some(DEFAULT_ORIGIN.to_string()),
            connect_timeout: Duration::from_secs(30),
            loading_interval: Duration::from_millis(500),
        }
    }
}

// The token must never end up in a log line.
impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("connection_url", &self.connection_url)
            .field("access_token", &"<redacted>")
            .field("origin", &self.origin)
            .field("connect_timeout", &self.connect_timeout)
            .field("loading_interval", &self.loading_interval)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
