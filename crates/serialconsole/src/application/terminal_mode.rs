//! Terminal raw-mode capability and its scoped guard.
//!
//! # What is raw mode? (for beginners)
//!
//! By default a terminal is in *cooked* mode: it buffers a whole line, echoes
//! what you type, and turns Ctrl+C into a signal.  A serial console must see
//! every keystroke as it is typed, including Ctrl+C (which the remote shell
//! should receive, not the local process).  Raw mode switches all of that off.
//!
//! Leaving the terminal raw after the program exits makes the user's shell
//! unusable, so the original mode is captured by [`TerminalModeController::enter`]
//! and put back by [`TerminalModeController::restore`].  [`RawModeGuard`] ties
//! the restore to scope exit so every path (quit, error, panic unwind) runs it.
//!
//! Two platform variants implement the trait: termios on Unix and the Win32
//! console mode API on Windows.  The right one is picked once at startup by
//! `infrastructure::terminal::platform_terminal`.

use thiserror::Error;
use tracing::debug;

/// Errors raised while configuring the local terminal.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// No interactive terminal is attached, or the platform refused to
    /// query/set its mode.  Fatal.
    #[error("terminal unavailable: {0}")]
    TerminalUnavailable(String),
}

/// Acquires and releases raw input mode on the local terminal.
pub trait TerminalModeController: Send {
    /// Switches to raw, unbuffered, non-echoing input and enables control
    /// sequence interpretation on output.  Captures the original mode first.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::TerminalUnavailable`] when stdin is not a
    /// terminal or a platform call fails.
    fn enter(&mut self) -> Result<(), TerminalError>;

    /// Puts back the mode captured by `enter`.
    ///
    /// Idempotent, and a no-op when `enter` never captured anything.
    fn restore(&mut self);

    /// Returns `true` while a captured mode is waiting to be restored.
    fn is_raw(&self) -> bool;
}

/// Scoped raw mode: entered on construction, restored on drop.
pub struct RawModeGuard {
    controller: Box<dyn TerminalModeController>,
}

impl RawModeGuard {
    /// Enters raw mode through `controller`.
    ///
    /// On failure a best-effort restore runs before the error is returned, so
    /// a partially applied mode (e.g. output configured, input refused) is
    /// rolled back.
    ///
    /// # Errors
    ///
    /// Propagates [`TerminalError`] from the controller.
    pub fn enter(mut controller: Box<dyn TerminalModeController>) -> Result<Self, TerminalError> {
        if let Err(e) = controller.enter() {
            controller.restore();
            return Err(e);
        }
        debug!("entered raw terminal mode");
        Ok(Self { controller })
    }

    /// Restores the terminal now.  Safe to call more than once; `Drop` will
    /// not restore a second time.
    pub fn restore(&mut self) {
        if self.controller.is_raw() {
            self.controller.restore();
            debug!("restored terminal mode");
        }
    }

    /// Returns `true` while raw mode is active.
    pub fn is_raw(&self) -> bool {
        self.controller.is_raw()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::terminal::mock::{MockTerminal, TerminalCall};

    #[test]
    fn test_guard_restores_on_drop() {
        // Arrange
        let terminal = MockTerminal::new();
        let calls = terminal.calls();

        // Act
        {
            let guard = RawModeGuard::enter(Box::new(terminal)).unwrap();
            assert!(guard.is_raw());
        }

        // Assert
        assert_eq!(*calls.lock().unwrap(), vec![TerminalCall::Enter, TerminalCall::Restore]);
    }

    #[test]
    fn test_explicit_restore_then_drop_restores_once() {
        let terminal = MockTerminal::new();
        let calls = terminal.calls();

        let mut guard = RawModeGuard::enter(Box::new(terminal)).unwrap();
        guard.restore();
        guard.restore();
        drop(guard);

        assert_eq!(*calls.lock().unwrap(), vec![TerminalCall::Enter, TerminalCall::Restore]);
    }

    #[test]
    fn test_failed_enter_attempts_best_effort_restore() {
        // Arrange
        let terminal = MockTerminal::failing();
        let calls = terminal.calls();

        // Act
        let result = RawModeGuard::enter(Box::new(terminal));

        // Assert
        assert!(matches!(result, Err(TerminalError::TerminalUnavailable(_))));
        assert_eq!(*calls.lock().unwrap(), vec![TerminalCall::Enter, TerminalCall::Restore]);
    }
}
