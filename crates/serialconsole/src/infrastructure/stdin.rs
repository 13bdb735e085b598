//! Blocking terminal reader.
//!
//! Reads from stdin block the calling thread, and tokio's own stdin wrapper
//! keeps the runtime alive until a pending read returns.  A plain OS thread
//! owns the reader instead and hands each chunk to the async side through an
//! unbounded channel.  When the process exits the thread is simply abandoned.

use std::io::{self, ErrorKind, Read};
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 1024;

/// Spawns a thread that forwards everything read from `reader`.
///
/// The channel closes when the reader reports EOF or an error, or when the
/// receiver is dropped.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_input_reader<R>(mut reader: R) -> io::Result<mpsc::UnboundedReceiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("input reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(error = %e, "input read failed");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn test_reader_forwards_bytes_then_closes() {
        // Arrange
        let input = Cursor::new(b"hello\r".to_vec());

        // Act
        let mut rx = spawn_input_reader(input).unwrap();
        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.extend(chunk);
        }

        // Assert
        assert_eq!(received, b"hello\r");
    }

    #[tokio::test]
    async fn test_empty_input_closes_immediately() {
        let mut rx = spawn_input_reader(io::empty()).unwrap();
        assert!(rx.recv().await.is_none());
    }

    /// Yields `Interrupted`, then one byte, then a hard error.
    struct FlakyReader {
        calls: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            match self.calls {
                1 => Err(io::Error::from(ErrorKind::Interrupted)),
                2 => {
                    buf[0] = b'x';
                    Ok(1)
                }
                _ => Err(io::Error::from(ErrorKind::BrokenPipe)),
            }
        }
    }

    #[tokio::test]
    async fn test_interrupted_read_is_retried_and_errors_close_the_channel() {
        let mut rx = spawn_input_reader(FlakyReader { calls: 0 }).unwrap();
        assert_eq!(rx.recv().await, Some(b"x".to_vec()));
        assert!(rx.recv().await.is_none());
    }
}
