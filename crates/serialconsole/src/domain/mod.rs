//! Domain layer for serialconsole.
//!
//! Only configuration lives here; the console's state machines are shared
//! with other tools through `serialconsole-core`.

pub mod config;

pub use config::ConsoleConfig;
