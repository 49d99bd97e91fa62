//! TCP chat server implementation.

mod banner;
mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ServerError;
pub use server::{BoundServer, Server};
pub use signal::shutdown_signal;
