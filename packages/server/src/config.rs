//! Server configuration

use std::time::Duration;

use crate::domain::DEFAULT_OUTBOX_CAPACITY;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8989;

/// Server configuration options, fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (`host:port`)
    pub bind_addr: String,

    /// Maximum concurrent clients
    pub max_clients: usize,

    /// Number of messages the pipeline buffers before read loops wait
    pub pipeline_capacity: usize,

    /// Number of messages kept for replay (0 = unlimited)
    pub history_limit: usize,

    /// Lines queued per client before further lines to it are dropped
    pub outbox_capacity: usize,

    /// Disconnect clients that send nothing for this long (None = never)
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_clients: 10,
            pipeline_capacity: 10,
            history_limit: 1000,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config bound to `host:port` with default limits
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bind_addr: format!("{}:{}", host, port),
            ..Default::default()
        }
    }

    /// Set the maximum number of concurrent clients
    pub fn max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Set the pipeline buffer size
    pub fn pipeline_capacity(mut self, capacity: usize) -> Self {
        self.pipeline_capacity = capacity;
        self
    }

    /// Set how many messages are kept for replay
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the per-client outbox size
    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }
}
