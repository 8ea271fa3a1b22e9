//! Relay logic and port traits for coachbot.
//!
//! This crate defines the "ports" (repository, backend, transcoding and
//! transport traits) that the infrastructure layer implements. It depends
//! only on `coachbot-types` -- never on `coachbot-infra` or any HTTP or
//! database crate.

pub mod backend;
pub mod clock;
pub mod dispatcher;
pub mod gate;
pub mod normalizer;
pub mod preprocess;
pub mod relay;
pub mod scanner;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;
