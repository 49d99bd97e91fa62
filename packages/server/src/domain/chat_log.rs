//! Chat log sink trait.

use async_trait::async_trait;

use super::ChatLogError;

/// Append-only sink for chat events.
///
/// Only the pipeline worker writes to it, so lines arrive in broadcast order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Append one line; implementations make it durable before returning
    async fn append(&self, line: &str) -> Result<(), ChatLogError>;

    /// Flush anything still buffered; called once on shutdown
    async fn flush(&self) -> Result<(), ChatLogError>;
}
