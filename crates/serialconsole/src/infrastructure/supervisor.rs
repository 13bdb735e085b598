//! Session supervisor: the one task that owns all mutable state.
//!
//! # Responsibilities
//!
//! - Feed terminal input through the escape dispatcher and route the
//!   resulting actions (send, reconnect, admin command, quit).
//! - Own the current [`ConnectionSession`] and apply the state transitions
//!   reported by its task.
//! - Print the user-facing prompts after a failed or closed connection.
//! - Shut everything down on quit, input EOF or a process interrupt.
//!
//! Because only this task mutates the session reference, no locks are needed;
//! the session task and the input thread talk to it through channels.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use serialconsole_core::{AdminCommand, EscapeDispatcher, SessionState};

use crate::application::ports::{AdminCommandSender, ConnectionNegotiator, ConsoleOutput};
use crate::application::route_keystrokes::{route, Route};
use crate::domain::ConsoleConfig;
use crate::infrastructure::session::{
    ConnectionSession, SessionContext, SessionEvent, SessionId,
};

/// Printed after a connection attempt fails.
pub const CONNECTION_FAILED_PROMPT: &str = "### Connection failed: Press Enter to try again...";

/// Printed after the remote side closes an open connection.
pub const CONNECTION_CLOSED_PROMPT: &str = "### Connection Closed: Press Enter to reconnect...";

/// Whether the input loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Why [`SessionSupervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The user typed the quit escape sequence.
    QuitCommand,
    /// Standard input reached EOF.
    InputClosed,
    /// The process received an interrupt signal.
    Interrupted,
}

/// Owns the dispatcher, the current session and the shutdown flag.
pub struct SessionSupervisor {
    ctx: Arc<SessionContext>,
    admin: Arc<dyn AdminCommandSender>,
    output: Arc<dyn ConsoleOutput>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    dispatcher: EscapeDispatcher,
    session: Option<ConnectionSession>,
    /// Reported state while no session exists.
    detached_state: SessionState,
    last_id: SessionId,
    terminating: Arc<AtomicBool>,
}

impl SessionSupervisor {
    pub fn new(
        config: &ConsoleConfig,
        negotiator: Arc<dyn ConnectionNegotiator>,
        admin: Arc<dyn AdminCommandSender>,
        output: Arc<dyn ConsoleOutput>,
    ) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        let terminating = Arc::new(AtomicBool::new(false));
        let ctx = Arc::new(SessionContext {
            negotiator,
            output: Arc::clone(&output),
            events,
            access_token: config.access_token.clone(),
            connect_timeout: config.connect_timeout,
            loading_interval: config.loading_interval,
            terminating: Arc::clone(&terminating),
        });

        Self {
            ctx,
            admin,
            output,
            events_rx,
            dispatcher: EscapeDispatcher::new(),
            session: None,
            detached_state: SessionState::Idle,
            last_id: 0,
            terminating,
        }
    }

    /// The lifecycle state of the current (or most recent) session.
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(self.detached_state, ConnectionSession::state)
    }

    /// Starts a new connection attempt unless one is in flight or open.
    pub fn connect(&mut self) {
        let state = self.state();
        if !state.accepts_reconnect() {
            debug!("connect ignored while {state}");
            return;
        }
        self.last_id += 1;
        self.session = Some(ConnectionSession::connect(self.last_id, Arc::clone(&self.ctx)));
    }

    /// Dispatches one chunk of terminal input.
    pub fn handle_input(&mut self, bytes: &[u8]) -> Flow {
        // Without an open session `^] s` has no key to wait for.
        self.dispatcher.set_sysrq_enabled(self.state().is_open());
        for action in self.dispatcher.feed(bytes) {
            match route(action, self.state()) {
                Route::Send(bytes) => {
                    if let Some(session) = &self.session {
                        if let Err(e) = session.send(bytes) {
                            trace!("keystrokes dropped: {e}");
                        }
                    }
                }
                Route::Reconnect => self.connect(),
                Route::Admin(command) => self.fire_admin_command(command),
                Route::Quit => return Flow::Quit,
                Route::Drop => trace!(state = %self.state(), "input discarded"),
            }
        }
        Flow::Continue
    }

    /// Sends `command` in the background.  The outcome is only logged.
    fn fire_admin_command(&self, command: AdminCommand) {
        let Some(connection_string) = self.session.as_ref().and_then(|s| s.connection_string())
        else {
            return;
        };
        let connection_string = connection_string.to_owned();
        let admin = Arc::clone(&self.admin);
        info!(%command, "admin command requested");
        tokio::spawn(async move {
            if let Err(e) = admin.send(&connection_string, command).await {
                debug!(%command, "admin command failed: {e}");
            }
        });
    }

    /// Applies a lifecycle event from a session task.
    pub fn handle_event(&mut self, event: SessionEvent) {
        let current = self.session.as_ref().map(ConnectionSession::id);
        if current != Some(event.id()) {
            debug!(id = event.id(), "ignoring event from a discarded session");
            return;
        }

        match event {
            SessionEvent::Opened {
                connection_string, ..
            } => {
                if let Some(session) = self.session.as_mut() {
                    if let Err(e) = session.mark_open(connection_string) {
                        warn!("{e}");
                    }
                }
            }
            SessionEvent::NegotiationFailed { error, .. } => {
                debug!("connection attempt failed: {error}");
                self.end_session(CONNECTION_FAILED_PROMPT);
            }
            SessionEvent::Closed { .. } => self.end_session(CONNECTION_CLOSED_PROMPT),
        }
    }

    /// Moves the current session to `Closed`, forgets it, and prompts.
    fn end_session(&mut self, prompt: &str) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.mark_closed() {
                warn!("{e}");
            }
        }
        self.detached_state = SessionState::Closed;
        if !self.terminating.load(Ordering::SeqCst) {
            self.output.status_line(prompt);
        }
    }

    /// Waits for the next session event.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Connects, then processes input and session events until shutdown.
    ///
    /// `interrupt` resolves when the process should stop, normally
    /// `tokio::signal::ctrl_c`.
    pub async fn run<F>(
        &mut self,
        mut input: mpsc::UnboundedReceiver<Vec<u8>>,
        interrupt: F,
    ) -> ShutdownReason
    where
        F: Future<Output = ()>,
    {
        // Each select! branch only produces a value; it is handled afterwards
        // so the branch futures no longer borrow `self`.
        enum Step {
            Input(Option<Vec<u8>>),
            Event(SessionEvent),
            Interrupt,
        }

        self.connect();
        tokio::pin!(interrupt);

        let reason = loop {
            let step = tokio::select! {
                _ = &mut interrupt => Step::Interrupt,
                chunk = input.recv() => Step::Input(chunk),
                Some(event) = self.events_rx.recv() => Step::Event(event),
            };

            match step {
                Step::Input(Some(bytes)) => {
                    if self.handle_input(&bytes) == Flow::Quit {
                        break ShutdownReason::QuitCommand;
                    }
                }
                Step::Input(None) => break ShutdownReason::InputClosed,
                Step::Event(event) => self.handle_event(event),
                Step::Interrupt => break ShutdownReason::Interrupted,
            }
        };

        info!(?reason, "shutting down");
        self.shutdown().await;
        reason
    }

    /// Sets the terminating flag and closes the current session.  Idempotent.
    pub async fn shutdown(&mut self) {
        self.terminating.store(true, Ordering::SeqCst);
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        self.detached_state = SessionState::Terminated;
    }

    /// `true` once [`shutdown`](Self::shutdown) has started.
    pub fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::SeqCst)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
