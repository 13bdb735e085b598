//! Platform-specific terminal mode controllers.
//!
//! The correct implementation is selected at compile time via `#[cfg(...)]`
//! and handed out as a trait object by [`platform_terminal`].

use crate::application::terminal_mode::TerminalModeController;

pub mod mock;

#[cfg(unix)]
pub mod unix;

#[cfg(target_os = "windows")]
pub mod windows;

/// Message printed when raw mode cannot be entered.
#[cfg(not(target_os = "windows"))]
pub const TERMINAL_ERROR_MESSAGE: &str =
    "Error configuring terminal: Make sure that app is running in a terminal.";

/// Message printed when raw mode cannot be entered.
#[cfg(target_os = "windows")]
pub const TERMINAL_ERROR_MESSAGE: &str =
    "Error configuring terminal: Make sure that app is running in a Windows 10 console.";

/// Returns the terminal controller for the current platform.
#[cfg(unix)]
pub fn platform_terminal() -> Box<dyn TerminalModeController> {
    Box::new(unix::UnixTerminal::stdin())
}

/// Returns the terminal controller for the current platform.
#[cfg(target_os = "windows")]
pub fn platform_terminal() -> Box<dyn TerminalModeController> {
    Box::new(windows::WindowsTerminal::new())
}
