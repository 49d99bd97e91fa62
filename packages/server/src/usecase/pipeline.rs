//! Message pipeline and its single worker.
//!
//! Read loops enqueue formatted [`OutboundMessage`]s onto a bounded channel;
//! one [`PipelineWorker`] drains it, appends each message to the chat log and
//! then broadcasts it. With one consumer the log order, the broadcast order
//! and the enqueue order are the same total order across all clients.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{ChatLog, OutboundMessage};

use super::{broadcast::BroadcastUseCase, error::PipelineClosed};

/// Producer side of the pipeline, cloned into every connection handler
#[derive(Clone)]
pub struct MessagePipeline {
    sender: mpsc::Sender<OutboundMessage>,
}

impl MessagePipeline {
    /// Create the pipeline and the worker that will drain it
    ///
    /// `capacity` bounds the number of queued messages; a zero capacity is
    /// raised to one.
    pub fn new(
        capacity: usize,
        chat_log: Arc<dyn ChatLog>,
        broadcast: Arc<BroadcastUseCase>,
    ) -> (Self, PipelineWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = PipelineWorker {
            receiver,
            chat_log,
            broadcast,
        };
        (Self { sender }, worker)
    }

    /// Queue a message, waiting while the pipeline is full
    ///
    /// # Errors
    ///
    /// Returns `PipelineClosed` once the worker has begun shutting down.
    pub async fn enqueue(&self, message: OutboundMessage) -> Result<(), PipelineClosed> {
        self.sender.send(message).await.map_err(|_| PipelineClosed)
    }
}

/// The single consumer of the pipeline
pub struct PipelineWorker {
    receiver: mpsc::Receiver<OutboundMessage>,
    chat_log: Arc<dyn ChatLog>,
    broadcast: Arc<BroadcastUseCase>,
}

impl PipelineWorker {
    /// Run the worker on its own task
    pub fn spawn(self) -> PipelineHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        PipelineHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Relay messages until shutdown, then drain what is already queued
    ///
    /// Returns the number of messages relayed.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> usize {
        let mut relayed = 0;
        let mut closing = false;

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(message) => {
                        self.relay(&message).await;
                        relayed += 1;
                    }
                    None => break,
                },
                _ = &mut shutdown, if !closing => {
                    closing = true;
                    self.receiver.close();
                    tracing::info!("Message pipeline closed, draining queued messages");
                }
            }
        }

        if let Err(e) = self.chat_log.flush().await {
            tracing::warn!("Failed to flush chat log: {}", e);
        }
        tracing::info!("Message pipeline stopped after relaying {} message(s)", relayed);

        relayed
    }

    async fn relay(&self, message: &OutboundMessage) {
        tracing::info!("{}", message.text());

        // A failing log must not hold up delivery
        if let Err(e) = self.chat_log.append(message.text()).await {
            tracing::warn!("Failed to write chat log: {}", e);
        }

        let report = self
            .broadcast
            .broadcast(message.text(), message.sender())
            .await;
        tracing::debug!(
            "Relayed to {} client(s), {} failed",
            report.delivered,
            report.failed
        );
    }
}

/// Handle to a running worker
pub struct PipelineHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<usize>,
}

impl PipelineHandle {
    /// Close the pipeline and wait until every queued message is relayed
    pub async fn shutdown(self) -> usize {
        // The worker may already have stopped on its own
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(relayed) => relayed,
            Err(e) => {
                tracing::error!("Message pipeline worker failed: {}", e);
                0
            }
        }
    }
}
