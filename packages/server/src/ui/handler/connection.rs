//! Per-connection handler: greeting, admission, read loop and teardown.
//!
//! `Connecting → AwaitingName → Active → Closed`. Until admission the
//! handler writes to the socket itself; after admission only the outbox
//! writer task does, fed by history replay and broadcasts.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{
    domain::{AdmissionError, Client, ClientName, ConnectionId, OutboundMessage},
    ui::{banner::write_greeting, state::AppState},
    usecase::ClientCandidate,
};

/// Longest accepted line in bytes, terminator included
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Why a session ended
#[derive(Debug, Error)]
enum SessionEnd {
    #[error("connection closed by peer")]
    Closed,

    #[error("read error: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("no input for {0:?}")]
    IdleTimeout(Duration),

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("server is shutting down")]
    PipelineClosed,
}

/// Drive one accepted connection until it closes
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<AppState>) {
    let id = ConnectionId::generate();
    tracing::debug!("Accepted connection {} from {}", id, peer);
    let (read_half, mut write_half) = stream.into_split();

    // Connecting
    if !state.admit_client_usecase.has_capacity().await {
        tracing::warn!("Max clients reached. Connection from {} refused.", peer);
        reject(&mut write_half, &AdmissionError::CapacityExceeded).await;
        return;
    }
    if let Err(e) = write_greeting(&mut write_half).await {
        tracing::warn!("Failed to greet {}: {}", peer, e);
        return;
    }

    // AwaitingName
    let mut reader = BufReader::new(read_half);
    let requested_name = match read_line(&mut reader, state.idle_timeout, MAX_LINE_BYTES).await {
        Ok(line) => line,
        Err(SessionEnd::Closed) => {
            tracing::debug!("Connection from {} closed before sending a name", peer);
            return;
        }
        Err(e) => {
            tracing::warn!("Error reading name from {}: {}", peer, e);
            return;
        }
    };

    let (outbox_tx, outbox_rx) = mpsc::channel(state.outbox_capacity);
    let candidate = ClientCandidate {
        id,
        requested_name,
        origin: peer.to_string(),
        outbox: outbox_tx,
    };
    let client = match state
        .broadcast_usecase
        .admit_with_replay(&state.admit_client_usecase, candidate)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Rejected connection from {}: {}", peer, e);
            reject(&mut write_half, &e).await;
            return;
        }
    };
    tracing::info!("Client {} ({}) connected", client.name(), client.origin());

    // Active
    let writer_task = outbox_writer(outbox_rx, write_half, client.name().clone());
    let end = match state.pipeline.enqueue(OutboundMessage::joined(&client)).await {
        Ok(()) => read_loop(&mut reader, &client, &state).await,
        Err(_) => SessionEnd::PipelineClosed,
    };

    // Closed
    if let Some(removed) = state.disconnect_client_usecase.execute(client.id()).await {
        tracing::info!("{} user left: {}", removed.name(), end);
        if state
            .pipeline
            .enqueue(OutboundMessage::left(&removed))
            .await
            .is_err()
        {
            tracing::debug!("Pipeline closed, departure of '{}' not announced", removed.name());
        }
    }
    drop(client);

    // The writer stops once every queued line is written and the last outbox sender is gone
    if let Err(e) = writer_task.await {
        tracing::error!("Outbox writer for connection {} failed: {}", id, e);
    }
    tracing::debug!("Connection {} from {} closed", id, peer);
}

/// Read chat lines from an admitted client and queue them for relay
async fn read_loop<R>(reader: &mut R, client: &Client, state: &AppState) -> SessionEnd
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match read_line(reader, state.idle_timeout, MAX_LINE_BYTES).await {
            Ok(line) => line,
            Err(end) => return end,
        };

        let body = line.trim();
        if body.is_empty() {
            continue;
        }

        let message = OutboundMessage::chat(client, body, state.clock.now());
        if state.pipeline.enqueue(message).await.is_err() {
            return SessionEnd::PipelineClosed;
        }
    }
}

/// Read one `\n`-terminated line of at most `max_len` bytes, decoding
/// invalid UTF-8 lossily
///
/// A final fragment without a terminator is discarded and reported as
/// `SessionEnd::Closed`; a line that reaches `max_len` without a terminator
/// ends the session with `SessionEnd::LineTooLong`.
async fn read_line<R>(
    reader: &mut R,
    idle_timeout: Option<Duration>,
    max_len: usize,
) -> Result<String, SessionEnd>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = (&mut *reader).take(max_len as u64);
    let read = limited.read_until(b'\n', &mut buf);
    let n = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| SessionEnd::IdleTimeout(limit))??,
        None => read.await?,
    };

    if buf.last() != Some(&b'\n') {
        if n > 0 && buf.len() >= max_len {
            return Err(SessionEnd::LineTooLong(max_len));
        }
        return Err(SessionEnd::Closed);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Send the rejection reason and close the write side
async fn reject<W>(writer: &mut W, reason: &AdmissionError)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = writer.write_all(reason.rejection_notice().as_bytes()).await {
        tracing::debug!("Failed to send rejection notice: {}", e);
    }
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Failed to close rejected connection: {}", e);
    }
}

/// Spawn the task that drains a client's outbox into its socket.
///
/// A write failure stops this task only; the client's read loop keeps going
/// until its own read fails.
fn outbox_writer(
    mut rx: mpsc::Receiver<String>,
    mut writer: OwnedWriteHalf,
    name: ClientName,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            let mut record = line.into_bytes();
            record.push(b'\n');
            if let Err(e) = writer.write_all(&record).await {
                tracing::warn!("Failed to write to client '{}': {}", name, e);
                break;
            }
        }
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("Failed to close connection of client '{}': {}", name, e);
        }
    })
}
