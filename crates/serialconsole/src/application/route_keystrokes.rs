//! Keystroke routing use case.
//!
//! The escape dispatcher turns raw bytes into [`EscapeAction`]s without
//! knowing whether a connection exists.  This module adds that knowledge:
//!
//! | Action      | Session open   | Idle / Closed            | Connecting |
//! |-------------|----------------|--------------------------|------------|
//! | `Forward`   | send           | reconnect if it has `\r` | drop       |
//! | `Admin`     | admin command  | drop                     | drop       |
//! | `Quit`      | quit           | quit                     | quit       |

use serialconsole_core::{AdminCommand, EscapeAction, SessionState};

/// Carriage return, what the Enter key sends in raw mode.
pub const ENTER: u8 = b'\r';

/// Where a resolved action should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Write the bytes to the open websocket.
    Send(Vec<u8>),
    /// Start a new connection attempt.
    Reconnect,
    /// Fire an admin command at the open session.
    Admin(AdminCommand),
    /// Shut down.
    Quit,
    /// Nothing to do with this input.
    Drop,
}

/// Routes one action given the current session state.
pub fn route(action: EscapeAction, state: SessionState) -> Route {
    match action {
        EscapeAction::Quit => Route::Quit,
        EscapeAction::Forward(bytes) if state.is_open() => Route::Send(bytes),
        EscapeAction::Forward(bytes) if state.accepts_reconnect() && bytes.contains(&ENTER) => {
            Route::Reconnect
        }
        EscapeAction::Forward(_) => Route::Drop,
        EscapeAction::Admin(command) if state.is_open() => Route::Admin(command),
        EscapeAction::Admin(_) => Route::Drop,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
