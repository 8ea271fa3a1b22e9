//! Infrastructure layer for coachbot.
//!
//! Contains implementations of the port traits defined in `coachbot-core`:
//! SQLite session storage, the OpenAI Assistants backend, Whisper and
//! ffmpeg voice adapters, plus config loading and data-dir layout.

pub mod assistant;
pub mod config;
pub mod filesystem;
pub mod sqlite;
pub mod voice;
