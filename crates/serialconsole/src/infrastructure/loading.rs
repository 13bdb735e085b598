//! "### Opening..." animation shown while a connection attempt is in flight.
//!
//! The animation runs as its own tokio task.  Each frame ends in `\r` so the
//! next frame overwrites it in place.  Stopping goes through a `watch`
//! channel, which wakes the task immediately instead of at its next tick, and
//! [`LoadingIndicator::stop`] waits for the task to blank the line so a
//! following prompt or console output starts on a clean row.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::trace;

use crate::application::ports::ConsoleOutput;

const LABEL: &str = "### Opening";
const MAX_DOTS: usize = 3;
const PADDING: &str = "   ";

/// Renders one animation frame with `dots` trailing dots.
pub fn frame(dots: usize) -> String {
    format!("{LABEL}{}{PADDING}\r", ".".repeat(dots % (MAX_DOTS + 1)))
}

/// Blanks the widest frame and returns the cursor to column 0.
pub fn clear_line() -> String {
    format!("\r{}\r", " ".repeat(LABEL.len() + MAX_DOTS + PADDING.len()))
}

/// Handle to a running animation.
///
/// Dropping the handle without calling [`stop`](Self::stop) also ends the
/// animation, but nobody waits for the line to be cleared.
pub struct LoadingIndicator {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoadingIndicator {
    /// Starts rendering frames to `output` every `interval`.  The first frame
    /// is written right away.
    pub fn start(output: Arc<dyn ConsoleOutput>, interval: Duration) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut dots = 0usize;

            loop {
                tokio::select! {
                    biased;
                    // Err means the handle was dropped: stop as well.
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        output.write(frame(dots).as_bytes());
                        dots = (dots + 1) % (MAX_DOTS + 1);
                    }
                }
            }

            output.write(clear_line().as_bytes());
            trace!("loading indicator stopped");
        });

        Self { stop_tx, task }
    }

    /// Stops the animation and waits until the line has been cleared.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            trace!(error = %e, "loading indicator task ended abnormally");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::output::MockOutput;

    #[test]
    fn test_frames_cycle_through_zero_to_three_dots() {
        assert_eq!(frame(0), "### Opening   \r");
        assert_eq!(frame(3), "### Opening...   \r");
        assert_eq!(frame(4), frame(0));
    }

    #[test]
    fn test_clear_line_covers_widest_frame() {
        let widest = frame(MAX_DOTS);
        assert_eq!(clear_line().len(), widest.len() + 1);
        assert!(clear_line().starts_with('\r') && clear_line().ends_with('\r'));
    }

    #[tokio::test]
    async fn test_indicator_animates_until_stopped() {
        // Arrange
        let output = Arc::new(MockOutput::new());

        // Act
        let indicator = LoadingIndicator::start(output.clone(), Duration::from_millis(10));
        time::sleep(Duration::from_millis(55)).await;
        indicator.stop().await;

        // Assert
        let text = output.text();
        assert!(text.starts_with(&frame(0)));
        assert!(text.contains(&frame(1)));
        assert!(text.ends_with(&clear_line()));
    }

    #[tokio::test]
    async fn test_no_output_after_stop_returns() {
        let output = Arc::new(MockOutput::new());
        let indicator = LoadingIndicator::start(output.clone(), Duration::from_millis(5));
        time::sleep(Duration::from_millis(12)).await;

        indicator.stop().await;
        let after_stop = output.contents();
        time::sleep(Duration::from_millis(30)).await;

        assert_eq!(output.contents(), after_stop);
    }

    #[tokio::test]
    async fn test_dropping_handle_ends_animation() {
        let output = Arc::new(MockOutput::new());
        let indicator = LoadingIndicator::start(output.clone(), Duration::from_millis(5));
        time::sleep(Duration::from_millis(12)).await;

        drop(indicator);
        time::sleep(Duration::from_millis(20)).await;
        let settled = output.contents();
        time::sleep(Duration::from_millis(30)).await;

        assert_eq!(output.contents(), settled);
        assert!(output.text().ends_with(&clear_line()));
    }
}
