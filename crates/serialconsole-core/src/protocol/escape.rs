//! Escape-sequence dispatcher for the keyboard stream.
//!
//! Every byte read from the raw terminal passes through [`EscapeDispatcher`].
//! Ordinary bytes come out as [`EscapeAction::Forward`]; the escape prefix
//! `0x1D` (Ctrl+]) switches to command mode for exactly one following byte:
//!
//! | Sequence        | Result                                        |
//! |-----------------|-----------------------------------------------|
//! | `^] ^]`         | literal `0x1D` forwarded                      |
//! | `^] n`          | [`AdminCommand::Nmi`]                         |
//! | `^] r`          | [`AdminCommand::Reset`]                       |
//! | `^] s <key>`    | [`AdminCommand::SysRq`] with `<key>`          |
//! | `^] q`          | [`EscapeAction::Quit`]                        |
//! | `^] <other>`    | discarded, nothing forwarded                  |
//!
//! The dispatcher does not know whether a session is open.  It
//! only turns bytes into actions; routing them (send, reconnect, drop) is the
//! caller's job.  The one exception is the SysRq key wait: while no session
//! is open the caller turns it off with
//! [`EscapeDispatcher::set_sysrq_enabled`], and `^] s` then ends the escape
//! sequence like any other unusable command byte.
//!
//! # Coalescing
//!
//! A single terminal read can return several bytes at once (a paste, or an
//! arrow key's `ESC [ A`).  [`EscapeDispatcher::feed`] merges adjacent
//! forwarded bytes into one `Forward` action so the session can send them as
//! one short frame instead of one frame per byte.

use tracing::trace;

use crate::domain::admin::AdminCommand;

/// The escape prefix byte: Ctrl+] (group separator).
pub const ESCAPE_PREFIX: u8 = 0x1D;

/// What the caller should do with a resolved piece of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeAction {
    /// Relay these bytes to the remote device, in order.
    Forward(Vec<u8>),
    /// Issue an admin command.
    Admin(AdminCommand),
    /// Shut the application down.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Normal,
    /// The previous byte was the escape prefix.
    PendingCommand,
    /// `^] s` was seen; the next byte is the SysRq key.
    PendingSysRqKey,
}

/// Outcome of a single byte.
enum Step {
    Forward(u8),
    Action(EscapeAction),
    Consumed,
}

/// State machine that separates literal keystrokes from control commands.
#[derive(Debug)]
pub struct EscapeDispatcher {
    state: DispatchState,
    sysrq_enabled: bool,
}

impl EscapeDispatcher {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Normal,
            sysrq_enabled: true,
        }
    }

    /// Controls whether `^] s` waits for a SysRq key.  When disabled, the
    /// `s` is discarded and the next byte is dispatched normally.  A wait
    /// already in progress is abandoned.
    pub fn set_sysrq_enabled(&mut self, enabled: bool) {
        self.sysrq_enabled = enabled;
        if !enabled && self.state == DispatchState::PendingSysRqKey {
            self.state = DispatchState::Normal;
        }
    }

    /// Processes one chunk of terminal input.
    ///
    /// Returns the resolved actions in input order.  Bytes following a
    /// [`EscapeAction::Quit`] in the same chunk are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serialconsole_core::{AdminCommand, EscapeAction, EscapeDispatcher};
    ///
    /// let mut dispatcher = EscapeDispatcher::new();
    /// let actions = dispatcher.feed(b"ls\x1dn\r");
    /// assert_eq!(
    ///     actions,
    ///     vec![
    ///         EscapeAction::Forward(b"ls".to_vec()),
    ///         EscapeAction::Admin(AdminCommand::Nmi),
    ///         EscapeAction::Forward(b"\r".to_vec()),
    ///     ]
    /// );
    /// ```
    pub fn feed(&mut self, input: &[u8]) -> Vec<EscapeAction> {
        let mut actions = Vec::new();
        let mut pending: Vec<u8> = Vec::new();

        for &byte in input {
            match self.step(byte) {
                Step::Forward(b) => pending.push(b),
                Step::Consumed => {}
                Step::Action(action) => {
                    if !pending.is_empty() {
                        actions.push(EscapeAction::Forward(std::mem::take(&mut pending)));
                    }
                    let quit = action == EscapeAction::Quit;
                    actions.push(action);
                    if quit {
                        self.reset();
                        return actions;
                    }
                }
            }
        }

        if !pending.is_empty() {
            actions.push(EscapeAction::Forward(pending));
        }
        actions
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            DispatchState::Normal => {
                if byte == ESCAPE_PREFIX {
                    self.state = DispatchState::PendingCommand;
                    Step::Consumed
                } else {
                    Step::Forward(byte)
                }
            }
            DispatchState::PendingCommand => {
                self.state = DispatchState::Normal;
                match byte {
                    ESCAPE_PREFIX => Step::Forward(ESCAPE_PREFIX),
                    b'n' => Step::Action(EscapeAction::Admin(AdminCommand::Nmi)),
                    b'r' => Step::Action(EscapeAction::Admin(AdminCommand::Reset)),
                    b's' if self.sysrq_enabled => {
                        self.state = DispatchState::PendingSysRqKey;
                        Step::Consumed
                    }
                    b'q' => Step::Action(EscapeAction::Quit),
                    other => {
                        trace!("discarding unrecognized escape command byte {other:#04x}");
                        Step::Consumed
                    }
                }
            }
            DispatchState::PendingSysRqKey => {
                self.state = DispatchState::Normal;
                Step::Action(EscapeAction::Admin(AdminCommand::SysRq { key: byte }))
            }
        }
    }

    /// Returns `true` while a command byte (or SysRq key) is still expected.
    pub fn is_pending(&self) -> bool {
        self.state != DispatchState::Normal
    }

    /// Forgets any half-typed escape sequence.
    pub fn reset(&mut self) {
        self.state = DispatchState::Normal;
    }
}

impl Default for EscapeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
