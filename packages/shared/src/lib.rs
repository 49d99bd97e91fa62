//! Shared utilities for the TCP chat relay.
//!
//! Logging setup and time handling used by the server crate and its binary.

pub mod logger;
pub mod time;
