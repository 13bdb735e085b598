//! Infrastructure layer for serialconsole.
//!
//! Everything that touches the operating system or the network lives here:
//!
//! - [`terminal`]: raw mode per platform (termios, Win32 console API)
//! - [`stdin`]: the blocking keyboard reader thread
//! - [`output`]: stdout writer, the CRLF log writer and a capturing mock
//! - [`http`]: connect negotiation and admin commands over HTTPS
//! - [`loading`]: the "### Opening..." animation task
//! - [`session`]: one websocket attachment and its task
//! - [`supervisor`]: the coordinating loop that owns the session

pub mod http;
pub mod loading;
pub mod output;
pub mod session;
pub mod stdin;
pub mod supervisor;
pub mod terminal;

pub use http::{HttpAdminChannel, HttpNegotiator};
pub use output::{CrlfWriter, StdoutOutput};
pub use session::{ConnectionSession, SendError, SessionEvent, SessionId};
pub use supervisor::{Flow, SessionSupervisor, ShutdownReason};
