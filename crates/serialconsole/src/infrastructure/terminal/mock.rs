//! Mock terminal controller for unit testing.
//!
//! The real controllers change the mode of whatever terminal runs the tests
//! (or fail outright under CI, where stdin is not a TTY).  `MockTerminal`
//! records each call instead so tests can assert on the exact sequence of
//! enter/restore operations.
//!
//! The call log is behind an `Arc` so a test can keep a handle to it after
//! the mock has been moved into a [`RawModeGuard`](crate::application::RawModeGuard).

use std::sync::{Arc, Mutex};

use crate::application::terminal_mode::{TerminalError, TerminalModeController};

/// One recorded controller call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCall {
    Enter,
    Restore,
}

/// A controller that records calls without touching a real terminal.
#[derive(Debug, Default)]
pub struct MockTerminal {
    calls: Arc<Mutex<Vec<TerminalCall>>>,
    raw: bool,
    /// When `true`, `enter` fails with `TerminalUnavailable`.
    pub should_fail: bool,
}

impl MockTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal whose `enter` always fails, like stdin redirected from a file.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Shared handle to the call log.
    pub fn calls(&self) -> Arc<Mutex<Vec<TerminalCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: TerminalCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl TerminalModeController for MockTerminal {
    fn enter(&mut self) -> Result<(), TerminalError> {
        self.record(TerminalCall::Enter);
        if self.should_fail {
            return Err(TerminalError::TerminalUnavailable("mock failure".into()));
        }
        self.raw = true;
        Ok(())
    }

    /// Records every call, even redundant ones, so tests can detect them.
    fn restore(&mut self) {
        self.record(TerminalCall::Restore);
        self.raw = false;
    }

    fn is_raw(&self) -> bool {
        self.raw
    }
}
