//! Server-level errors.

use thiserror::Error;

use crate::domain::ChatLogError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound; fatal at startup
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ChatLog(#[from] ChatLogError),
}
