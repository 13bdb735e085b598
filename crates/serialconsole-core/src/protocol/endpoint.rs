//! URL derivation for the three endpoints the client talks to.
//!
//! ```text
//! ARM connect endpoint   POST https://management.azure.com/.../serialPorts/0/connect?api-version=...
//!        │  200 {"connectionString": "wss://host/.../client"}
//!        ▼
//! websocket              wss://host/.../client?authorization=<token>
//!        │
//!        ▼
//! admin command          POST https://host/.../adminCommand/<command>
//! ```
//!
//! All functions here are pure string transformations; they never touch the
//! network.

use thiserror::Error;

use crate::domain::admin::AdminCommand;

/// API version of the serial console resource provider.
pub const SERIAL_CONSOLE_API_VERSION: &str = "2018-05-01";

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Path suffix of the console stream endpoint.
const CLIENT_SUFFIX: &str = "/client";

/// Path segment of the admin command endpoint.
const ADMIN_COMMAND_SEGMENT: &str = "/adminCommand/";

/// Errors produced while deriving an endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The websocket URL does not start with `ws://` or `wss://`.
    #[error("unsupported websocket scheme in '{0}'")]
    UnsupportedScheme(String),

    /// The websocket URL has no `/client` path segment to rewrite.
    #[error("websocket URL '{0}' has no '/client' path segment")]
    MissingClientSuffix(String),
}

/// Identity of a virtual machine whose serial port is being attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmIdentity {
    pub subscription_id: String,
    pub resource_group: String,
    pub vm_name: String,
}

/// Builds the ARM connect endpoint for serial port 0 of the given VM.
///
/// A trailing slash on `arm_endpoint` is tolerated.
pub fn arm_connect_url(arm_endpoint: &str, vm: &VmIdentity) -> String {
    format!(
        "{}/subscriptions/{}/resourcegroups/{}/providers/Microsoft.Compute/virtualMachines/{}\
         /providers/Microsoft.SerialConsole/serialPorts/0/connect?api-version={}",
        arm_endpoint.trim_end_matches('/'),
        vm.subscription_id,
        vm.resource_group,
        vm.vm_name,
        SERIAL_CONSOLE_API_VERSION,
    )
}

/// Appends the `authorization` query parameter to the negotiated
/// `connectionString`.
///
/// # Example
///
/// ```rust
/// use serialconsole_core::websocket_url;
///
/// assert_eq!(
///     websocket_url("wss://host/client", "abc"),
///     "wss://host/client?authorization=abc"
/// );
/// ```
pub fn websocket_url(connection_string: &str, token: &str) -> String {
    let separator = if connection_string.contains('?') { '&' } else { '?' };
    format!("{connection_string}{separator}authorization={token}")
}

/// Derives the admin command endpoint from the websocket URL.
///
/// The scheme is mapped `wss → https` / `ws → http` and the last `/client`
/// path segment becomes `/adminCommand/<command>`.  Any query string is kept.
///
/// # Errors
///
/// - [`EndpointError::UnsupportedScheme`] for a non-websocket URL.
/// - [`EndpointError::MissingClientSuffix`] when there is no `/client` segment.
///
/// # Example
///
/// ```rust
/// use serialconsole_core::{admin_command_url, AdminCommand};
///
/// let url = admin_command_url("wss://host/client", &AdminCommand::Nmi).unwrap();
/// assert_eq!(url, "https://host/adminCommand/nmi");
/// ```
pub fn admin_command_url(websocket_url: &str, command: &AdminCommand) -> Result<String, EndpointError> {
    let (scheme, rest) = if let Some(rest) = websocket_url.strip_prefix("wss://") {
        ("https://", rest)
    } else if let Some(rest) = websocket_url.strip_prefix("ws://") {
        ("http://", rest)
    } else {
        return Err(EndpointError::UnsupportedScheme(websocket_url.to_string()));
    };

    let (path, query) = match rest.find('?') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let idx = path
        .rfind(CLIENT_SUFFIX)
        .ok_or_else(|| EndpointError::MissingClientSuffix(websocket_url.to_string()))?;

    Ok(format!(
        "{scheme}{}{ADMIN_COMMAND_SEGMENT}{}{}{query}",
        &path[..idx],
        command.name(),
        &path[idx + CLIENT_SUFFIX.len()..],
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
