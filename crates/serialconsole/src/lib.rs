//! serialconsole library crate.
//!
//! An interactive, terminal-attached client for a remote serial console that
//! is exposed over a websocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! keyboard (raw mode)                        remote serial port
//!         │                                          ▲
//!         ▼                                          │ websocket
//! [serialconsole]                                    │
//!   ├── domain/           ConsoleConfig              │
//!   ├── application/      capability traits, keystroke routing,
//!   │                     terminal raw-mode guard
//!   └── infrastructure/
//!         ├── terminal/   termios / Win32 console mode controllers
//!         ├── stdin       blocking keyboard reader thread
//!         ├── http/       connect negotiation + admin commands (reqwest)
//!         ├── session     one websocket attachment (tokio-tungstenite)
//!         ├── loading     "### Opening..." animation
//!         └── supervisor  owns the current session, drives everything
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `serialconsole-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `reqwest`,
//!   and `tokio-tungstenite`.

/// Domain layer: configuration.
pub mod domain;

/// Application layer: traits at the I/O seams and the routing use case.
pub mod application;

/// Infrastructure layer: terminal, HTTP, websocket, and the supervisor.
pub mod infrastructure;
