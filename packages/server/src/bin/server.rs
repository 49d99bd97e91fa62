//! Line-based TCP chat server.
//!
//! Relays every line a client sends to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tcpchat-server
//! cargo run --bin tcpchat-server -- --port 2525 --max-clients 4
//! ```
//! and connect with `nc localhost 8989`.

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tcpchat_server::{
    config::{DEFAULT_PORT, ServerConfig},
    domain::{DEFAULT_OUTBOX_CAPACITY, HistoryBuffer},
    infrastructure::{chat_log::FileChatLog, registry::InMemoryClientRegistry},
    ui::{Server, ServerError},
    usecase::{AdmitClientUseCase, BroadcastUseCase, DisconnectClientUseCase},
};
use tcpchat_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tcpchat-server")]
#[command(about = "Line-based TCP chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of concurrently connected clients
    #[arg(short = 'm', long, default_value = "10")]
    max_clients: usize,

    /// File every chat event is appended to (recreated on startup)
    #[arg(short = 'l', long, default_value = "chat_logs.txt")]
    log_file: PathBuf,

    /// Number of messages replayed to new clients (0 = all)
    #[arg(long, default_value = "1000")]
    history_limit: usize,

    /// Number of messages buffered before senders wait
    #[arg(long, default_value = "10")]
    pipeline_capacity: usize,

    /// Lines queued per client before messages to it are dropped
    #[arg(long, default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// Disconnect clients idle for this many seconds (disabled when omitted)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let config = ServerConfig::new(&args.host, args.port)
        .max_clients(args.max_clients)
        .pipeline_capacity(args.pipeline_capacity)
        .history_limit(args.history_limit)
        .outbox_capacity(args.outbox_capacity)
        .idle_timeout(args.idle_timeout_secs.map(Duration::from_secs));

    // Initialize dependencies in order:
    // 1. Registry
    // 2. ChatLog
    // 3. UseCases
    // 4. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemoryClientRegistry::new(config.max_clients));

    // 2. Create ChatLog (file sink)
    let chat_log = Arc::new(FileChatLog::create(&args.log_file).await?);

    // 3. Create UseCases
    let admit_client_usecase = Arc::new(AdmitClientUseCase::new(registry.clone()));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(registry.clone()));
    let broadcast_usecase = Arc::new(BroadcastUseCase::new(
        registry,
        HistoryBuffer::with_limit(config.history_limit),
    ));

    // 4. Create and run the server
    let server = Server::new(
        config,
        admit_client_usecase,
        disconnect_client_usecase,
        broadcast_usecase,
        chat_log,
        Arc::new(SystemClock),
    );
    server.run().await
}
