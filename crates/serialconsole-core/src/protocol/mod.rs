//! Keystroke interpretation and endpoint derivation.

pub mod endpoint;
pub mod escape;

pub use endpoint::{admin_command_url, arm_connect_url, websocket_url, EndpointError, VmIdentity};
pub use escape::{EscapeAction, EscapeDispatcher, ESCAPE_PREFIX};
