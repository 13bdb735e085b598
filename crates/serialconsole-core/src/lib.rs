//! # serialconsole-core
//!
//! Shared library for the serial console client containing the keystroke
//! escape-sequence dispatcher, the session lifecycle state machine, the admin
//! command value objects, and the endpoint derivation rules.
//!
//! It has zero dependencies on OS APIs, terminals, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A serial console client attaches the local keyboard and screen to the
//! virtual serial port of a remote machine.  Three things travel over the one
//! keyboard stream:
//!
//! - ordinary typed bytes, relayed to the remote device as-is,
//! - control commands (NMI, reset, SysRq, quit) introduced by the escape
//!   prefix byte `0x1D` (Ctrl+]),
//! - the reconnect trigger (Enter) while no connection is open.
//!
//! This crate defines:
//!
//! - **`protocol`** – How keystrokes are interpreted ([`EscapeDispatcher`]) and
//!   how URLs are derived for the connect, websocket, and admin endpoints.
//!
//! - **`domain`** – Pure business types: the [`SessionState`] lifecycle and the
//!   [`AdminCommand`] / [`AdminCommandRequest`] value objects.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `serialconsole_core::EscapeDispatcher` instead of the full module path.
pub use domain::admin::{AdminCommand, AdminCommandRequest};
pub use domain::session_state::{SessionState, TransitionError};
pub use protocol::endpoint::{
    admin_command_url, arm_connect_url, websocket_url, EndpointError, VmIdentity,
    DEFAULT_ARM_ENDPOINT,
};
pub use protocol::escape::{EscapeAction, EscapeDispatcher, ESCAPE_PREFIX};
