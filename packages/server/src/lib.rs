//! Line-based TCP chat relay library.
//!
//! Clients connect over TCP, choose a display name and exchange newline
//! terminated messages that are relayed to every other connected client.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
