//! Entities of the chat relay.

use chrono::NaiveDateTime;
use tcpchat_shared::time::format_chat_timestamp;
use tokio::sync::mpsc;

use super::value_object::{ClientName, ConnectionId};

/// Outbound queue of one admitted client.
///
/// Every line the server sends to an admitted client (replayed history and
/// live broadcasts) goes through this channel; the connection's writer task
/// is the only thing that writes to the socket after admission. The channel
/// is bounded: a client that stops reading loses lines instead of growing
/// the queue.
pub type OutboxChannel = mpsc::Sender<String>;

/// Default number of lines an outbox holds before new lines are dropped
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

/// An admitted chat participant
#[derive(Debug, Clone)]
pub struct Client {
    id: ConnectionId,
    name: ClientName,
    /// Peer address the connection was accepted from
    origin: String,
    outbox: OutboxChannel,
}

impl Client {
    pub fn new(id: ConnectionId, name: ClientName, origin: String, outbox: OutboxChannel) -> Self {
        Self {
            id,
            name,
            origin,
            outbox,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn name(&self) -> &ClientName {
        &self.name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Queue one line for delivery to this client without waiting
    ///
    /// # Errors
    ///
    /// * `TrySendError::Full` - the outbox is full; the line is not queued
    /// * `TrySendError::Closed` - the writer task has stopped
    pub fn push(&self, line: &str) -> Result<(), mpsc::error::TrySendError<String>> {
        self.outbox.try_send(line.to_string())
    }
}

/// A formatted chat event on its way through the pipeline.
///
/// `text` is exactly what gets logged, stored in the history and written to
/// recipients (without the trailing newline). `sender` is never a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    text: String,
    sender: ConnectionId,
}

impl OutboundMessage {
    /// `[YYYY-MM-DD HH:MM:SS][name]: body`
    pub fn chat(sender: &Client, body: &str, sent_at: NaiveDateTime) -> Self {
        Self {
            text: format!(
                "[{}][{}]: {}",
                format_chat_timestamp(sent_at),
                sender.name(),
                body
            ),
            sender: *sender.id(),
        }
    }

    pub fn joined(client: &Client) -> Self {
        Self {
            text: format!("{} has joined our chat...", client.name()),
            sender: *client.id(),
        }
    }

    pub fn left(client: &Client) -> Self {
        Self {
            text: format!("{} has left our chat...", client.name()),
            sender: *client.id(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> &ConnectionId {
        &self.sender
    }
}
