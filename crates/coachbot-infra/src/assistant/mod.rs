//! OpenAI Assistants v2 backend.
//!
//! Threads, messages, runs and file uploads over plain reqwest.

pub mod client;
pub mod types;

pub use client::OpenAiAssistantsBackend;
