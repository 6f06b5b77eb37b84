//! AWS-oriented adapters and handlers for the device relay functions.
//!
//! This crate owns runtime integration details (Lambda handlers, HTTP
//! transport, configuration, log setup) on top of the pure primitives in
//! `device_relay_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod notifier;
