//! Lifecycle of one logical console attachment.
//!
//! ```text
//!            connect()            socket opened
//!   Idle ──────────────> Connecting ─────────────> Open
//!                          │   ▲                    │
//!     negotiation failed   │   │ Enter (no socket)  │ remote hung up / close()
//!                          ▼   │                    ▼
//!                          Closed <─────────────────┘
//!
//!   any state ── application shutdown ──> Terminated (final)
//! ```
//!
//! `Closed → Connecting` is only reachable through an explicit user reconnect.
//! The state machine itself does not know about keys; the supervisor decides
//! *when* to ask for the transition and this module decides *whether* it is
//! legal.

use std::fmt;

use thiserror::Error;

/// The lifecycle state of a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Created, no connection attempt made yet.
    #[default]
    Idle,
    /// Negotiating the websocket URL or performing the websocket handshake.
    Connecting,
    /// Websocket open; keystrokes are relayed to the remote device.
    Open,
    /// Connection failed or ended; waiting for the user to press Enter.
    Closed,
    /// The application shut down.  No transition leaves this state.
    Terminated,
}

/// Returned when a transition is not allowed by the lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal session transition {from} -> {to}")]
pub struct TransitionError {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            (Idle, Connecting)
            | (Connecting, Open)
            | (Connecting, Closed)
            | (Open, Closed)
            | (Closed, Connecting) => true,
            _ => false,
        }
    }

    /// Performs the transition, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the lifecycle forbids the move.
    pub fn transition(self, next: SessionState) -> Result<SessionState, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// Only an open session has a socket that keystrokes can be written to.
    pub fn is_open(self) -> bool {
        self == SessionState::Open
    }

    /// A user reconnect (Enter) is honoured only while no socket is open and
    /// no attempt is already in flight.
    pub fn accepts_reconnect(self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
