//! UseCase layer: admission, broadcast/replay, departure and the message pipeline.

pub mod admit_client;
pub mod broadcast;
pub mod disconnect_client;
pub mod error;
pub mod pipeline;

pub use admit_client::{AdmitClientUseCase, ClientCandidate};
pub use broadcast::{BroadcastReport, BroadcastUseCase};
pub use disconnect_client::DisconnectClientUseCase;
pub use error::PipelineClosed;
pub use pipeline::{MessagePipeline, PipelineHandle, PipelineWorker};
