//! Windows raw mode via the console mode API.
//!
//! Windows 10 consoles understand VT sequences only when asked to:
//! `ENABLE_VIRTUAL_TERMINAL_PROCESSING` on the output handle renders the
//! remote device's escape sequences, and `ENABLE_VIRTUAL_TERMINAL_INPUT` on
//! the input handle makes arrow keys arrive as VT sequences.  Echo, line
//! buffering and Ctrl+C processing are switched off so keystrokes reach the
//! remote side untouched.
//!
//! Handles are looked up again in `restore` instead of being stored, which
//! keeps the controller `Send`.

#![cfg(target_os = "windows")]

use tracing::{debug, warn};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Console::{
    GetConsoleMode, GetStdHandle, SetConsoleMode, CONSOLE_MODE, ENABLE_ECHO_INPUT,
    ENABLE_LINE_INPUT, ENABLE_PROCESSED_INPUT, ENABLE_VIRTUAL_TERMINAL_INPUT,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};

use crate::application::terminal_mode::{TerminalError, TerminalModeController};

/// Console-mode controller for the process's standard handles.
#[derive(Debug, Default)]
pub struct WindowsTerminal {
    original_input: Option<CONSOLE_MODE>,
    original_output: Option<CONSOLE_MODE>,
}

impl WindowsTerminal {
    pub fn new() -> Self {
        Self::default()
    }
}

fn std_handle(which: STD_HANDLE) -> Result<HANDLE, TerminalError> {
    // SAFETY: GetStdHandle has no preconditions.
    unsafe { GetStdHandle(which) }
        .map_err(|e| TerminalError::TerminalUnavailable(format!("GetStdHandle: {e}")))
}

fn console_mode(handle: HANDLE) -> Result<CONSOLE_MODE, TerminalError> {
    let mut mode = CONSOLE_MODE(0);
    // SAFETY: mode is a valid out-pointer for the duration of the call.
    unsafe { GetConsoleMode(handle, &mut mode) }
        .map_err(|e| TerminalError::TerminalUnavailable(format!("GetConsoleMode: {e}")))?;
    Ok(mode)
}

fn set_console_mode(handle: HANDLE, mode: CONSOLE_MODE) -> Result<(), TerminalError> {
    // SAFETY: handle came from GetStdHandle.
    unsafe { SetConsoleMode(handle, mode) }
        .map_err(|e| TerminalError::TerminalUnavailable(format!("SetConsoleMode: {e}")))
}

impl TerminalModeController for WindowsTerminal {
    fn enter(&mut self) -> Result<(), TerminalError> {
        let output = std_handle(STD_OUTPUT_HANDLE)?;
        let out_mode = console_mode(output)?;
        set_console_mode(
            output,
            CONSOLE_MODE(out_mode.0 | ENABLE_VIRTUAL_TERMINAL_PROCESSING.0),
        )?;
        self.original_output = Some(out_mode);

        let input = std_handle(STD_INPUT_HANDLE)?;
        let in_mode = console_mode(input)?;
        let cooked = ENABLE_ECHO_INPUT.0 | ENABLE_LINE_INPUT.0 | ENABLE_PROCESSED_INPUT.0;
        set_console_mode(
            input,
            CONSOLE_MODE((in_mode.0 | ENABLE_VIRTUAL_TERMINAL_INPUT.0) & !cooked),
        )?;
        self.original_input = Some(in_mode);

        debug!("console switched to raw VT mode");
        Ok(())
    }

    fn restore(&mut self) {
        if let Some(mode) = self.original_input.take() {
            if let Err(e) = std_handle(STD_INPUT_HANDLE).and_then(|h| set_console_mode(h, mode)) {
                warn!(error = %e, "failed to restore console input mode");
            }
        }
        if let Some(mode) = self.original_output.take() {
            if let Err(e) = std_handle(STD_OUTPUT_HANDLE).and_then(|h| set_console_mode(h, mode)) {
                warn!(error = %e, "failed to restore console output mode");
            }
        }
    }

    fn is_raw(&self) -> bool {
        self.original_input.is_some() || self.original_output.is_some()
    }
}
