//! Session persistence abstractions.
//!
//! `SessionRepository` is the storage port; `SessionStore` layers the
//! subscription contract on top of it.

pub mod repository;
pub mod store;
