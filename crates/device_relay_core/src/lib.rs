//! Shared device relay domain primitives.
//!
//! This crate owns event decoding, shadow documents, request signing, chat
//! channel mapping and call rate limiting. It intentionally excludes HTTP
//! clients and Lambda runtime concerns, which live in `device_relay_lambda`.

pub mod channel;
pub mod clock;
pub mod cooldown;
pub mod error;
pub mod event;
pub mod phone;
pub mod shadow;
pub mod signing;

pub use error::RelayError;
