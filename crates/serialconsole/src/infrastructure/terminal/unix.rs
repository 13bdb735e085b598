//! Unix raw mode via termios.
//!
//! `enter` snapshots the current `termios` of the file descriptor, applies
//! `cfmakeraw` to a copy and installs it.  `restore` puts the snapshot back
//! with `TCSADRAIN` so output already queued for the terminal is written
//! before the mode changes.

#![cfg(unix)]

use std::io;
use std::os::unix::io::RawFd;

use tracing::{debug, warn};

use crate::application::terminal_mode::{TerminalError, TerminalModeController};

/// termios-backed controller for one file descriptor (normally stdin).
pub struct UnixTerminal {
    fd: RawFd,
    original: Option<libc::termios>,
}

impl UnixTerminal {
    pub fn new(fd: RawFd) -> Self {
        Self { fd, original: None }
    }

    /// Controller for the process's standard input.
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

fn os_error(call: &str) -> TerminalError {
    TerminalError::TerminalUnavailable(format!("{call}: {}", io::Error::last_os_error()))
}

impl TerminalModeController for UnixTerminal {
    fn enter(&mut self) -> Result<(), TerminalError> {
        // SAFETY: isatty only inspects the descriptor.
        if unsafe { libc::isatty(self.fd) } != 1 {
            return Err(TerminalError::TerminalUnavailable(
                "standard input is not a terminal".into(),
            ));
        }

        let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fully initialises the struct when it returns 0.
        if unsafe { libc::tcgetattr(self.fd, termios.as_mut_ptr()) } != 0 {
            return Err(os_error("tcgetattr"));
        }
        // SAFETY: checked above.
        let original = unsafe { termios.assume_init() };

        let mut raw = original;
        // SAFETY: raw is a valid, initialised termios.
        unsafe { libc::cfmakeraw(&mut raw) };

        // SAFETY: raw is a valid termios for this descriptor.
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(os_error("tcsetattr"));
        }

        self.original = Some(original);
        debug!(fd = self.fd, "termios switched to raw");
        Ok(())
    }

    fn restore(&mut self) {
        let Some(original) = self.original.take() else {
            return;
        };
        // SAFETY: original came from tcgetattr on the same descriptor.
        if unsafe { libc::tcsetattr(self.fd, libc::TCSADRAIN, &original) } != 0 {
            warn!(
                fd = self.fd,
                error = %io::Error::last_os_error(),
                "failed to restore terminal settings"
            );
        }
    }

    fn is_raw(&self) -> bool {
        self.original.is_some()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
