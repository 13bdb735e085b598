//! One attachment to the remote serial console.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//!   connect() ──► Connecting ──negotiate + handshake ok──► Open ──remote hangs up──► Closed
//!                     │                                                              ▲
//!                     └──────────── HTTP error / bad body / handshake error ─────────┘
//! ```
//!
//! A [`ConnectionSession`] is the supervisor's handle; the actual work runs
//! in a tokio task spawned by [`ConnectionSession::connect`].  The task never
//! touches the supervisor's state directly.  It reports what happened through
//! [`SessionEvent`]s, each tagged with the session's id, and the supervisor
//! applies the matching state transition.  Events from a session the
//! supervisor has already discarded are recognised by their id and ignored.
//!
//! Application-initiated shutdown goes through [`ConnectionSession::close`],
//! which signals the task over a `watch` channel.  A closed-by-us session
//! sends no event, so no reconnect prompt appears.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use serialconsole_core::{websocket_url, SessionState, TransitionError};

use crate::application::ports::{ConnectError, ConnectionNegotiator, ConsoleOutput};
use crate::infrastructure::loading::LoadingIndicator;

/// Identifies one connection attempt.
pub type SessionId = u64;

/// How long `close` waits for the task to send its Close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle notifications from a session task to the supervisor.
#[derive(Debug)]
pub enum SessionEvent {
    /// Negotiation and handshake succeeded.
    Opened {
        id: SessionId,
        connection_string: String,
    },
    /// The attempt failed before the stream became usable.
    NegotiationFailed { id: SessionId, error: ConnectError },
    /// The remote side closed an open stream.
    Closed { id: SessionId },
}

impl SessionEvent {
    pub fn id(&self) -> SessionId {
        match self {
            SessionEvent::Opened { id, .. }
            | SessionEvent::NegotiationFailed { id, .. }
            | SessionEvent::Closed { id } => *id,
        }
    }
}

/// Keystrokes could not be handed to the session.  Always swallowed by the
/// caller: the remote end may have hung up between two keystrokes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("send failed: session is {0}")]
    NotOpen(SessionState),

    #[error("send failed: session task has ended")]
    TaskEnded,
}

/// Everything a session task needs, shared by all sessions of one run.
pub struct SessionContext {
    pub negotiator: Arc<dyn ConnectionNegotiator>,
    pub output: Arc<dyn ConsoleOutput>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub access_token: String,
    pub connect_timeout: Duration,
    pub loading_interval: Duration,
    /// Set once the application is shutting down.
    pub terminating: Arc<AtomicBool>,
}

/// The supervisor's handle to one connection attempt.
pub struct ConnectionSession {
    id: SessionId,
    state: SessionState,
    connection_string: Option<String>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    close_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ConnectionSession {
    /// Starts a connection attempt in the background and returns at once in
    /// the `Connecting` state.
    pub fn connect(id: SessionId, ctx: Arc<SessionContext>) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = watch::channel(false);

        debug!("session {id}: connecting");
        let task = tokio::spawn(run_session(id, ctx, outbound_rx, close_rx));

        Self {
            id,
            // Idle -> Connecting happens here, before the handle is visible.
            state: SessionState::Connecting,
            connection_string: None,
            outbound,
            close_tx,
            task,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The websocket URL (without authorization) once the session is open.
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    /// Queues `bytes` as one outbound frame.
    ///
    /// # Errors
    ///
    /// [`SendError::NotOpen`] unless the session is `Open`,
    /// [`SendError::TaskEnded`] if the socket task is gone.
    pub fn send(&self, bytes: Vec<u8>) -> Result<(), SendError> {
        if !self.state.is_open() {
            return Err(SendError::NotOpen(self.state));
        }
        self.outbound.send(bytes).map_err(|_| SendError::TaskEnded)
    }

    /// Applies `Connecting -> Open`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the session is not `Connecting`.
    pub fn mark_open(&mut self, connection_string: String) -> Result<(), TransitionError> {
        self.state = self.state.transition(SessionState::Open)?;
        self.connection_string = Some(connection_string);
        Ok(())
    }

    /// Applies `Connecting | Open -> Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] from any other state.
    pub fn mark_closed(&mut self) -> Result<(), TransitionError> {
        self.state = self.state.transition(SessionState::Closed)?;
        Ok(())
    }

    /// Application-initiated close.  Sends a Close frame if the socket is
    /// open, waits briefly for the task, and aborts it if it does not finish.
    /// No [`SessionEvent`] is produced.
    pub async fn close(mut self) {
        debug!("session {}: closing", self.id);
        let _ = self.close_tx.send(true);
        if tokio::time::timeout(CLOSE_GRACE, &mut self.task).await.is_err() {
            warn!("session {}: task did not stop in time, aborting", self.id);
            self.task.abort();
        }
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

/// Negotiates the websocket URL and performs the handshake.
async fn open_stream(ctx: &SessionContext) -> Result<(String, WsStream), ConnectError> {
    let connection_string = ctx.negotiator.negotiate().await?;
    let url = websocket_url(&connection_string, &ctx.access_token);
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| ConnectError::SocketOpen(e.to_string()))?;
    Ok((connection_string, stream))
}

/// Stops the loading animation if it is still running.
async fn stop_loading(indicator: &mut Option<LoadingIndicator>) {
    if let Some(indicator) = indicator.take() {
        indicator.stop().await;
    }
}

/// Outbound bytes go out as a text frame when they are valid UTF-8, as a
/// binary frame otherwise.
fn outbound_frame(bytes: Vec<u8>) -> Message {
    match String::from_utf8(bytes) {
        Ok(text) => Message::Text(text),
        Err(e) => Message::Binary(e.into_bytes()),
    }
}

async fn run_session(
    id: SessionId,
    ctx: Arc<SessionContext>,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut close_rx: watch::Receiver<bool>,
) {
    // ── Step 1: Animate while we wait ─────────────────────────────────────────
    let mut indicator = Some(LoadingIndicator::start(
        Arc::clone(&ctx.output),
        ctx.loading_interval,
    ));

    // ── Step 2: Negotiate and open the websocket ──────────────────────────────
    //
    // The whole attempt is bounded by `connect_timeout`, and a close request
    // abandons it immediately.
    let attempt = tokio::time::timeout(ctx.connect_timeout, open_stream(&ctx));
    let result = tokio::select! {
        biased;
        _ = close_rx.changed() => {
            stop_loading(&mut indicator).await;
            debug!("session {id}: closed while connecting");
            return;
        }
        result = attempt => result.unwrap_or_else(|_| Err(ConnectError::TimedOut(ctx.connect_timeout))),
    };

    let (connection_string, stream) = match result {
        Ok(opened) => opened,
        Err(error) => {
            stop_loading(&mut indicator).await;
            info!("session {id}: connection failed: {error}");
            let _ = ctx.events.send(SessionEvent::NegotiationFailed { id, error });
            return;
        }
    };

    info!("session {id}: websocket open");
    let _ = ctx.events.send(SessionEvent::Opened {
        id,
        connection_string,
    });

    // ── Step 3: Relay until one side goes away ────────────────────────────────
    let (mut ws_tx, mut ws_rx) = stream.split();

    loop {
        tokio::select! {
            biased;

            _ = close_rx.changed() => {
                stop_loading(&mut indicator).await;
                if let Err(e) = ws_tx.send(Message::Close(None)).await {
                    debug!("session {id}: close frame not sent: {e}");
                }
                debug!("session {id}: closed by application");
                return;
            }

            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    stop_loading(&mut indicator).await;
                    ctx.output.write(text.as_bytes());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    stop_loading(&mut indicator).await;
                    ctx.output.write(&bytes);
                }
                // tungstenite has already queued the Close reply.
                Some(Ok(Message::Close(frame))) => {
                    debug!("session {id}: remote sent close {frame:?}");
                    break;
                }
                Some(Ok(other)) => {
                    trace!("session {id}: control frame {other:?}");
                }
                Some(Err(e)) => {
                    debug!("session {id}: websocket error: {e}");
                    break;
                }
                None => break,
            },

            bytes = outbound_rx.recv() => match bytes {
                Some(bytes) => {
                    if let Err(e) = ws_tx.send(outbound_frame(bytes)).await {
                        debug!("session {id}: send failed: {e}");
                    }
                }
                // The handle was dropped without `close`.
                None => {
                    stop_loading(&mut indicator).await;
                    return;
                }
            },
        }
    }

    // ── Step 4: Organic close ─────────────────────────────────────────────────
    stop_loading(&mut indicator).await;
    if ctx.terminating.load(Ordering::SeqCst) {
        debug!("session {id}: stream ended during shutdown");
        return;
    }
    info!("session {id}: remote closed the connection");
    let _ = ctx.events.send(SessionEvent::Closed { id });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::MockConnectionNegotiator;
    use crate::infrastructure::output::MockOutput;

    fn context(
        negotiator: Arc<dyn ConnectionNegotiator>,
        output: Arc<MockOutput>,
        connect_timeout: Duration,
    ) -> (Arc<SessionContext>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let ctx = SessionContext {
            negotiator,
            output,
            events,
            access_token: "abc".into(),
            connect_timeout,
            loading_interval: Duration::from_millis(5),
            terminating: Arc::new(AtomicBool::new(false)),
        };
        (Arc::new(ctx), rx)
    }

    /// A negotiator that never answers.
    struct HangingNegotiator;

    #[async_trait]
    impl ConnectionNegotiator for HangingNegotiator {
        async fn negotiate(&self) -> Result<String, ConnectError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_negotiation_failure_reports_event_and_clears_indicator() {
        // Arrange
        let mut negotiator = MockConnectionNegotiator::new();
        negotiator
            .expect_negotiate()
            .times(1)
            .returning(|| Err(ConnectError::Status(500)));
        let output = Arc::new(MockOutput::new());
        let (ctx, mut events) = context(Arc::new(negotiator), output.clone(), Duration::from_secs(5));

        // Act
        let session = ConnectionSession::connect(7, ctx);
        let event = events.recv().await.unwrap();

        // Assert
        assert!(matches!(
            event,
            SessionEvent::NegotiationFailed { id: 7, error: ConnectError::Status(500) }
        ));
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(output.text().ends_with(&crate::infrastructure::loading::clear_line()));
    }

    /// A localhost port that nothing listens on.
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_unreachable_websocket_is_a_socket_open_failure() {
        let url = format!("ws://127.0.0.1:{}/client", closed_port());
        let mut negotiator = MockConnectionNegotiator::new();
        negotiator
            .expect_negotiate()
            .returning(move || Ok(url.clone()));
        let (ctx, mut events) = context(
            Arc::new(negotiator),
            Arc::new(MockOutput::new()),
            Duration::from_secs(5),
        );

        let _session = ConnectionSession::connect(1, ctx);

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::NegotiationFailed { error: ConnectError::SocketOpen(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_attempt_times_out() {
        let (ctx, mut events) = context(
            Arc::new(HangingNegotiator),
            Arc::new(MockOutput::new()),
            Duration::from_millis(30),
        );

        let _session = ConnectionSession::connect(2, ctx);

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::NegotiationFailed { error: ConnectError::TimedOut(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_close_while_connecting_produces_no_event() {
        // Arrange
        let output = Arc::new(MockOutput::new());
        let (ctx, mut events) =
            context(Arc::new(HangingNegotiator), output.clone(), Duration::from_secs(30));
        let session = ConnectionSession::connect(3, ctx.clone());

        // Act
        session.close().await;
        drop(ctx);

        // Assert: the channel closes without any event.
        assert!(events.recv().await.is_none());
        assert!(output.text().ends_with(&crate::infrastructure::loading::clear_line()));
    }

    #[tokio::test]
    async fn test_send_requires_open_state() {
        let (ctx, _events) = context(
            Arc::new(HangingNegotiator),
            Arc::new(MockOutput::new()),
            Duration::from_secs(30),
        );
        let mut session = ConnectionSession::connect(4, ctx);

        assert_eq!(
            session.send(b"x".to_vec()),
            Err(SendError::NotOpen(SessionState::Connecting))
        );

        session.mark_open("ws://host/client".into()).unwrap();
        assert_eq!(session.connection_string(), Some("ws://host/client"));
        assert!(session.mark_open("ws://host/client".into()).is_err());

        session.mark_closed().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.close().await;
    }

    #[tokio::test]
    async fn test_close_frame_ends_session_while_tcp_stays_open() {
        // Arrange: the remote sends Close but keeps the TCP connection.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/client", listener.local_addr().unwrap());
        let (hold_tx, hold_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
            let _ = hold_rx.await;
            drop(ws);
        });

        let mut negotiator = MockConnectionNegotiator::new();
        negotiator
            .expect_negotiate()
            .returning(move || Ok(url.clone()));
        let (ctx, mut events) = context(
            Arc::new(negotiator),
            Arc::new(MockOutput::new()),
            Duration::from_secs(5),
        );

        // Act
        let _session = ConnectionSession::connect(5, ctx);
        let opened = tokio::time::timeout(Duration::from_secs(5), events.recv()).await.unwrap();
        let closed = tokio::time::timeout(Duration::from_secs(5), events.recv()).await.unwrap();

        // Assert
        assert!(matches!(opened, Some(SessionEvent::Opened { id: 5, .. })));
        assert!(matches!(closed, Some(SessionEvent::Closed { id: 5 })));
        drop(hold_tx);
    }

    #[test]
    fn test_outbound_frame_kind_follows_utf8_validity() {
        assert_eq!(outbound_frame(b"ls\r".to_vec()), Message::Text("ls\r".into()));
        assert_eq!(outbound_frame(vec![0x1d]), Message::Text("\u{1d}".into()));
        assert_eq!(outbound_frame(vec![0xff, 0x00]), Message::Binary(vec![0xff, 0x00]));
    }
}
