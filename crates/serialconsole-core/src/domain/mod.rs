//! Domain entities for the serial console client.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application holds the core business rules: here,
//! which states a console attachment may move between, and what an admin
//! command request looks like.  Nothing in this module opens a socket, touches
//! the terminal, or reads the clock, so every rule can be unit-tested on any
//! platform without setup.

/// Admin command value objects (NMI, reset, SysRq).
pub mod admin;

/// Lifecycle state machine of a single console attachment.
pub mod session_state;
