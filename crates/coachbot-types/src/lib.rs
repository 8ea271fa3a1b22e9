//! Shared domain types for coachbot.
//!
//! Sessions, content envelopes, runs, inbound events, configuration and
//! the error taxonomy used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod config;
pub mod envelope;
pub mod error;
pub mod inbound;
pub mod run;
pub mod session;
