//! Infrastructure layer: concrete registry and chat log implementations.

pub mod chat_log;
pub mod registry;
