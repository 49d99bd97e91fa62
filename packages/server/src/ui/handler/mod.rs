//! Connection handlers.

mod connection;

pub use connection::handle_connection;
