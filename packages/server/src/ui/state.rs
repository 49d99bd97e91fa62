//! Server state shared by every connection handler.

use std::{sync::Arc, time::Duration};

use tcpchat_shared::time::Clock;

use crate::usecase::{
    AdmitClientUseCase, BroadcastUseCase, DisconnectClientUseCase, MessagePipeline,
};

/// Shared application state
pub struct AppState {
    /// AdmitClientUseCase（クライアント受け入れのユースケース）
    pub admit_client_usecase: Arc<AdmitClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// BroadcastUseCase（ブロードキャストとリプレイのユースケース）
    pub broadcast_usecase: Arc<BroadcastUseCase>,
    /// Producer side of the message pipeline
    pub pipeline: MessagePipeline,
    /// Source of chat timestamps
    pub clock: Arc<dyn Clock>,
    /// Size of each admitted client's outbox
    pub outbox_capacity: usize,
    pub idle_timeout: Option<Duration>,
}
