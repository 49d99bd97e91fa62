//! UseCase errors.

use thiserror::Error;

/// The pipeline no longer accepts messages (the server is shutting down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message pipeline is closed")]
pub struct PipelineClosed;
