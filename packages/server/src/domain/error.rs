//! Domain errors.

use thiserror::Error;

/// Reasons a connection is refused before it becomes an active client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("name is empty")]
    EmptyName,

    #[error("name '{0}' is already in use")]
    NameTaken(String),

    #[error("maximum number of clients reached")]
    CapacityExceeded,
}

impl AdmissionError {
    /// Text written to the refused peer before the socket is closed
    pub fn rejection_notice(&self) -> &'static str {
        match self {
            AdmissionError::EmptyName => "Sorry! Empty name can't be accepted.\nDisconnected...\n",
            AdmissionError::NameTaken(_) => {
                "Sorry! The name you are trying to enter is already in use.\nDisconnected...\n"
            }
            AdmissionError::CapacityExceeded => {
                "Maximum connection limit reached. Please try again later...\n"
            }
        }
    }
}

/// Failures of the chat log sink
#[derive(Debug, Error)]
pub enum ChatLogError {
    #[error("chat log I/O error: {0}")]
    Io(#[from] std::io::Error),
}
