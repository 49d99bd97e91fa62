//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use tcpchat_shared::time::Clock;
use tokio::net::TcpListener;

use crate::{
    config::ServerConfig,
    domain::ChatLog,
    usecase::{
        AdmitClientUseCase, BroadcastUseCase, DisconnectClientUseCase, MessagePipeline,
        PipelineHandle,
    },
};

use super::{error::ServerError, handler::handle_connection, signal::shutdown_signal, state::AppState};

/// TCP chat server
///
/// This struct encapsulates the server configuration and its use cases, and
/// provides methods to bind and run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     config,
///     admit_client_usecase,
///     disconnect_client_usecase,
///     broadcast_usecase,
///     chat_log,
///     Arc::new(SystemClock),
/// );
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    /// AdmitClientUseCase（クライアント受け入れのユースケース）
    admit_client_usecase: Arc<AdmitClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// BroadcastUseCase（ブロードキャストとリプレイのユースケース）
    broadcast_usecase: Arc<BroadcastUseCase>,
    /// Sink the pipeline worker appends every chat event to
    chat_log: Arc<dyn ChatLog>,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        config: ServerConfig,
        admit_client_usecase: Arc<AdmitClientUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        broadcast_usecase: Arc<BroadcastUseCase>,
        chat_log: Arc<dyn ChatLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            admit_client_usecase,
            disconnect_client_usecase,
            broadcast_usecase,
            chat_log,
            clock,
        }
    }

    /// Bind the listener and start the message pipeline worker
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the configured address cannot be bound.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.bind_addr.clone(),
                source,
            })?;

        let (pipeline, worker) = MessagePipeline::new(
            self.config.pipeline_capacity,
            self.chat_log,
            self.broadcast_usecase.clone(),
        );
        let pipeline_handle = worker.spawn();

        let state = Arc::new(AppState {
            admit_client_usecase: self.admit_client_usecase,
            disconnect_client_usecase: self.disconnect_client_usecase,
            broadcast_usecase: self.broadcast_usecase,
            pipeline,
            clock: self.clock,
            outbox_capacity: self.config.outbox_capacity.max(1),
            idle_timeout: self.config.idle_timeout,
        });

        Ok(BoundServer {
            listener,
            state,
            pipeline_handle,
        })
    }

    /// Run the TCP chat server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve(shutdown_signal()).await
    }
}

/// A server whose listener is bound and whose pipeline worker is running
pub struct BoundServer {
    listener: TcpListener,
    state: Arc<AppState>,
    pipeline_handle: PipelineHandle,
}

impl BoundServer {
    /// The address the listener actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves, then close the pipeline
    /// and wait for it to drain
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let local_addr = self.listener.local_addr()?;
        tracing::info!("TCP chat server listening on {}", local_addr);
        tracing::info!("Connect with: nc {} {}", local_addr.ip(), local_addr.port());
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(stream, peer, self.state.clone()));
                    }
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                    }
                },
            }
        }

        drop(self.listener);
        let relayed = self.pipeline_handle.shutdown().await;
        tracing::info!("Server shutdown complete ({} message(s) relayed)", relayed);

        Ok(())
    }
}
