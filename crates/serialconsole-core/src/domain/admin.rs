//! Admin command value objects.
//!
//! Admin commands are out-of-band nudges sent to the remote device over HTTP
//! rather than through the console stream: a non-maskable interrupt, a hard
//! reset, or a SysRq key.  Each invocation produces a fresh
//! [`AdminCommandRequest`] that is serialized as the JSON request body:
//!
//! ```json
//! {
//!   "command": "sysrq",
//!   "requestId": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
//!   "commandParameters": { "SysRqCommand": "b" }
//! }
//! ```
//!
//! Requests are never persisted; they are built, sent once, and dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Parameter key carrying the SysRq letter.
pub const SYSRQ_PARAMETER: &str = "SysRqCommand";

/// An administrative action against the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminCommand {
    /// Non-maskable interrupt.
    Nmi,
    /// Hard reset of the device.
    Reset,
    /// SysRq with the key byte typed after `Ctrl+] s`.
    SysRq { key: u8 },
}

impl AdminCommand {
    /// The command name used both in the endpoint path and the request body.
    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::Nmi => "nmi",
            AdminCommand::Reset => "reset",
            AdminCommand::SysRq { .. } => "sysrq",
        }
    }

    /// Command-specific parameters.  Empty for NMI and reset.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let AdminCommand::SysRq { key } = self {
            params.insert(SYSRQ_PARAMETER.to_string(), char::from(*key).to_string());
        }
        params
    }

    /// Builds a request with a freshly generated request id.
    pub fn to_request(&self) -> AdminCommandRequest {
        AdminCommandRequest {
            command: self.name(),
            request_id: Uuid::new_v4(),
            command_parameters: self.parameters(),
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCommand::SysRq { key } => write!(f, "sysrq({:?})", char::from(*key)),
            other => f.write_str(other.name()),
        }
    }
}

/// JSON body of an admin command POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCommandRequest {
    pub command: &'static str,
    pub request_id: Uuid,
    pub command_parameters: BTreeMap<String, String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
