//! Domain layer: value objects, entities and the interfaces the use cases depend on.

pub mod chat_log;
pub mod entity;
pub mod error;
pub mod history;
pub mod repository;
pub mod value_object;

pub use chat_log::ChatLog;
pub use entity::{Client, DEFAULT_OUTBOX_CAPACITY, OutboundMessage, OutboxChannel};
pub use error::{AdmissionError, ChatLogError};
pub use history::HistoryBuffer;
pub use repository::ClientRegistry;
pub use value_object::{ClientName, ConnectionId};
