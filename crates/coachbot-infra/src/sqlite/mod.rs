//! SQLite storage layer.
//!
//! The session repository, backed by SQLite in WAL mode with split
//! read/write connection pools.

pub mod pool;
pub mod session;
