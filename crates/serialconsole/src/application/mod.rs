//! Application layer for serialconsole.
//!
//! The application layer knows *what* to do with keystrokes and connection
//! outcomes, but delegates *how* to the infrastructure layer through the
//! traits in [`ports`] and [`terminal_mode`].
//!
//! # Responsibilities
//!
//! - Declaring the capability traits the supervisor depends on
//!   (connect negotiation, admin commands, console output, terminal mode)
//! - Deciding where a resolved keystroke goes ([`route_keystrokes`])
//! - The scoped raw-mode guard
//!
//! # What does NOT belong here?
//!
//! - HTTP requests, websocket frames, termios calls (infrastructure)
//! - Tokio task spawning (infrastructure)

pub mod ports;
pub mod route_keystrokes;
pub mod terminal_mode;

pub use ports::{AdminCommandError, AdminCommandSender, ConnectError, ConnectionNegotiator, ConsoleOutput};
pub use route_keystrokes::{route, Route};
pub use terminal_mode::{RawModeGuard, TerminalError, TerminalModeController};
