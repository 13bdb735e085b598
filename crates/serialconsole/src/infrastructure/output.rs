//! Console output implementations.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::debug;

use crate::application::ports::ConsoleOutput;

/// Writes to the process's standard output, flushing after every write so
/// characters echoed by the remote device appear immediately.
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl StdoutOutput {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleOutput for StdoutOutput {
    fn write(&self, bytes: &[u8]) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(bytes).and_then(|()| stdout.flush()) {
            debug!(error = %e, "stdout write failed");
        }
    }
}

/// Log writer that turns bare `\n` into `\r\n`.
///
/// Raw mode turns off output post-processing, so log lines written to
/// stderr while the console is attached would otherwise staircase across
/// the remote screen.
#[derive(Debug)]
pub struct CrlfWriter<W> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl CrlfWriter<io::Stderr> {
    /// Standard error, for `tracing_subscriber`'s `with_writer`.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut translated = Vec::with_capacity(buf.len() + 8);
        let mut prev = None;
        for &byte in buf {
            if byte == b'\n' && prev != Some(b'\r') {
                translated.push(b'\r');
            }
            translated.push(byte);
            prev = Some(byte);
        }
        self.inner.write_all(&translated)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Captures everything written, for tests.
#[derive(Debug, Default)]
pub struct MockOutput {
    buffer: Mutex<Vec<u8>>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Output decoded lossily, convenient for matching prompts.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    pub fn clear(&self) {
        if let Ok(mut b) = self.buffer.lock() {
            b.clear();
        }
    }
}

impl ConsoleOutput for MockOutput {
    fn write(&self, bytes: &[u8]) {
        if let Ok(mut b) = self.buffer.lock() {
            b.extend_from_slice(bytes);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_output_accumulates_writes() {
        let out = MockOutput::new();
        out.write(b"abc");
        out.write(&[0xff]);
        assert_eq!(out.contents(), vec![b'a', b'b', b'c', 0xff]);
    }

    #[test]
    fn test_mock_output_status_line_and_clear() {
        let out = MockOutput::new();
        out.status_line("### hi");
        assert!(out.contains("\r\n### hi\r\n"));
        out.clear();
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_crlf_writer_adds_carriage_returns() {
        // Arrange
        let mut writer = CrlfWriter::new(Vec::new());

        // Act
        write!(writer, "WARN first\nWARN second\n").unwrap();
        writer.flush().unwrap();

        // Assert
        assert_eq!(writer.into_inner(), b"WARN first\r\nWARN second\r\n".to_vec());
    }

    #[test]
    fn test_crlf_writer_keeps_existing_crlf() {
        let mut writer = CrlfWriter::new(Vec::new());

        let written = writer.write(b"a\r\nb").unwrap();

        assert_eq!(written, 4);
        assert_eq!(writer.into_inner(), b"a\r\nb".to_vec());
    }
}
