//! Integration tests for the TCP chat server using real sockets against an
//! in-process server.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use chrono::NaiveDate;
use tcpchat_server::{
    config::ServerConfig,
    domain::{ClientRegistry, HistoryBuffer},
    infrastructure::{chat_log::FileChatLog, registry::InMemoryClientRegistry},
    ui::{Server, ServerError},
    usecase::{AdmitClientUseCase, BroadcastUseCase, DisconnectClientUseCase},
};
use tcpchat_shared::time::FixedClock;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const TIMEOUT: Duration = Duration::from_secs(3);
const QUIET_PERIOD: Duration = Duration::from_millis(200);
const NAME_PROMPT: &[u8] = b"[ENTER YOUR NAME]: ";
const TS: &str = "2024-01-02 15:04:05";

/// Helper struct to manage an in-process server's lifecycle
struct TestServer {
    addr: SocketAddr,
    registry: Arc<InMemoryClientRegistry>,
    log_path: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    _log_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a test server on an ephemeral port
    async fn start(max_clients: usize) -> Self {
        let log_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let log_path = log_dir.path().join("chat_logs.txt");

        let registry = Arc::new(InMemoryClientRegistry::new(max_clients));
        let chat_log = Arc::new(
            FileChatLog::create(&log_path)
                .await
                .expect("Failed to create chat log"),
        );
        let clock = FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(15, 4, 5)
                .unwrap(),
        );

        let server = Server::new(
            ServerConfig::new("127.0.0.1", 0).max_clients(max_clients),
            Arc::new(AdmitClientUseCase::new(registry.clone())),
            Arc::new(DisconnectClientUseCase::new(registry.clone())),
            Arc::new(BroadcastUseCase::new(
                registry.clone(),
                HistoryBuffer::unbounded(),
            )),
            chat_log,
            Arc::new(clock),
        );
        let bound = server.bind().await.expect("Failed to bind server");
        let addr = bound.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(bound.serve(async move {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            addr,
            registry,
            log_path,
            shutdown: Some(shutdown_tx),
            task: Some(task),
            _log_dir: log_dir,
        }
    }

    /// Wait until exactly `count` clients are registered
    async fn wait_for_clients(&self, count: usize) {
        let result = timeout(TIMEOUT, async {
            while self.registry.size().await != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(
            result.is_ok(),
            "Expected {} registered client(s), found {}",
            count,
            self.registry.size().await
        );
    }

    /// Shut the server down and return the chat log contents
    async fn stop(mut self) -> String {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            timeout(TIMEOUT, task)
                .await
                .expect("Server did not shut down in time")
                .expect("Server task panicked")
                .expect("Server returned an error");
        }
        tokio::fs::read_to_string(&self.log_path)
            .await
            .expect("Failed to read chat log")
    }
}

/// Helper struct wrapping one raw TCP chat connection
struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("Failed to connect");
        let (read_half, writer) = stream.into_split();
        TestClient {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    /// Connect, consume the greeting and send `name`
    async fn join(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        let greeting = client.read_greeting().await;
        assert!(greeting.starts_with("Welcome to TCP-Chat!\n"));
        client.send_line(name).await;
        client
    }

    /// Read everything up to and including the name prompt
    async fn read_greeting(&mut self) -> String {
        let mut greeting = Vec::new();
        while !greeting.ends_with(NAME_PROMPT) {
            let mut byte = [0u8; 1];
            let n = timeout(TIMEOUT, self.reader.read(&mut byte))
                .await
                .expect("Timed out waiting for greeting")
                .expect("Failed to read greeting");
            assert!(n > 0, "Connection closed during greeting");
            greeting.push(byte[0]);
        }
        String::from_utf8(greeting).expect("Greeting is not UTF-8")
    }

    async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("Failed to send line");
    }

    /// Next line without its terminator, or `None` on EOF
    async fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = timeout(TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for a line")
            .expect("Failed to read line");
        if n == 0 {
            None
        } else {
            Some(line.trim_end_matches('\n').to_string())
        }
    }

    async fn expect_line(&mut self, expected: &str) {
        assert_eq!(self.next_line().await.as_deref(), Some(expected));
    }

    /// Assert nothing arrives for a short while
    async fn expect_silence(&mut self) {
        let mut line = String::new();
        let result = timeout(QUIET_PERIOD, self.reader.read_line(&mut line)).await;
        assert!(result.is_err(), "Unexpected line: {:?}", line);
    }
}

#[tokio::test]
async fn test_message_is_relayed_to_others_but_not_sender() {
    // テスト項目: メッセージは送信者以外に届き、送信者には届かない（シナリオ A）
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut alice = TestClient::join(server.addr, "Alice").await;
    server.wait_for_clients(1).await;
    let mut bob = TestClient::join(server.addr, "Bob").await;
    alice.expect_line("Bob has joined our chat...").await;
    bob.expect_line("Alice has joined our chat...").await;

    // when (操作):
    alice.send_line("hi").await;

    // then (期待する結果):
    bob.expect_line(&format!("[{}][Alice]: hi", TS)).await;
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    // テスト項目: 使用中の名前での接続は拒否され、接続が閉じられる（シナリオ B）
    // given (前提条件):
    let server = TestServer::start(10).await;
    let _alice = TestClient::join(server.addr, "Alice").await;
    server.wait_for_clients(1).await;

    // when (操作):
    let mut bob = TestClient::join(server.addr, "Alice").await;

    // then (期待する結果):
    bob.expect_line("Sorry! The name you are trying to enter is already in use.")
        .await;
    bob.expect_line("Disconnected...").await;
    assert_eq!(bob.next_line().await, None);
    assert_eq!(server.registry.size().await, 1);
}

#[tokio::test]
async fn test_connection_beyond_capacity_is_rejected() {
    // テスト項目: 上限に達している場合、新しい接続は拒否される（シナリオ C）
    // given (前提条件):
    let server = TestServer::start(1).await;
    let _alice = TestClient::join(server.addr, "A").await;
    server.wait_for_clients(1).await;

    // when (操作):
    let mut b = TestClient::connect(server.addr).await;

    // then (期待する結果):
    b.expect_line("Maximum connection limit reached. Please try again later...")
        .await;
    assert_eq!(b.next_line().await, None);
    assert_eq!(server.registry.size().await, 1);
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    // テスト項目: 空の名前での接続は拒否される
    // given (前提条件):
    let server = TestServer::start(10).await;

    // when (操作):
    let mut client = TestClient::join(server.addr, "   ").await;

    // then (期待する結果):
    client
        .expect_line("Sorry! Empty name can't be accepted.")
        .await;
    client.expect_line("Disconnected...").await;
    assert_eq!(client.next_line().await, None);
    assert_eq!(server.registry.size().await, 0);
}

#[tokio::test]
async fn test_late_joiner_receives_history_before_live_messages() {
    // テスト項目: 後から参加したクライアントは過去のメッセージを順番通りに受け取り、その後ライブ配送を受け取る（シナリオ D）
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut alice = TestClient::join(server.addr, "alice").await;
    server.wait_for_clients(1).await;
    let mut bob = TestClient::join(server.addr, "bob").await;
    alice.expect_line("bob has joined our chat...").await;
    bob.expect_line("alice has joined our chat...").await;
    alice.send_line("one").await;
    alice.send_line("two").await;
    bob.expect_line(&format!("[{}][alice]: one", TS)).await;
    bob.expect_line(&format!("[{}][alice]: two", TS)).await;

    // when (操作):
    let mut charlie = TestClient::join(server.addr, "charlie").await;
    alice.expect_line("charlie has joined our chat...").await;
    alice.send_line("three").await;

    // then (期待する結果):
    charlie.expect_line("alice has joined our chat...").await;
    charlie.expect_line("bob has joined our chat...").await;
    charlie.expect_line(&format!("[{}][alice]: one", TS)).await;
    charlie.expect_line(&format!("[{}][alice]: two", TS)).await;
    charlie.expect_line(&format!("[{}][alice]: three", TS)).await;
    charlie.expect_silence().await;
}

#[tokio::test]
async fn test_abrupt_disconnect_is_announced_once() {
    // テスト項目: 切断したクライアントの退出通知が残りのクライアントにちょうど一度だけ届く（シナリオ E）
    // given (前提条件):
    let server = TestServer::start(10).await;
    let a = TestClient::join(server.addr, "A").await;
    server.wait_for_clients(1).await;
    let mut b = TestClient::join(server.addr, "B").await;
    b.expect_line("A has joined our chat...").await;
    server.wait_for_clients(2).await;

    // when (操作):
    drop(a);

    // then (期待する結果):
    b.expect_line("A has left our chat...").await;
    b.expect_silence().await;
    server.wait_for_clients(1).await;
}

#[tokio::test]
async fn test_blank_lines_are_not_relayed() {
    // テスト項目: 空白だけの行は転送されない
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut alice = TestClient::join(server.addr, "alice").await;
    server.wait_for_clients(1).await;
    let mut bob = TestClient::join(server.addr, "bob").await;
    alice.expect_line("bob has joined our chat...").await;
    bob.expect_line("alice has joined our chat...").await;

    // when (操作):
    alice.send_line("   ").await;
    alice.send_line("").await;
    alice.send_line("  real message  ").await;

    // then (期待する結果):
    bob.expect_line(&format!("[{}][alice]: real message", TS))
        .await;
    bob.expect_silence().await;
}

#[tokio::test]
async fn test_messages_from_one_client_keep_their_order() {
    // テスト項目: 同じクライアントから送ったメッセージは送信順に届く
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut alice = TestClient::join(server.addr, "alice").await;
    server.wait_for_clients(1).await;
    let mut bob = TestClient::join(server.addr, "bob").await;
    alice.expect_line("bob has joined our chat...").await;
    bob.expect_line("alice has joined our chat...").await;

    // when (操作):
    for i in 0..50 {
        alice.send_line(&format!("message {}", i)).await;
    }

    // then (期待する結果):
    for i in 0..50 {
        bob.expect_line(&format!("[{}][alice]: message {}", TS, i))
            .await;
    }
}

#[tokio::test]
async fn test_chat_log_records_events_in_broadcast_order() {
    // テスト項目: チャットログに参加・メッセージ・退出がブロードキャスト順に記録される
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut alice = TestClient::join(server.addr, "alice").await;
    server.wait_for_clients(1).await;
    let mut bob = TestClient::join(server.addr, "bob").await;
    alice.expect_line("bob has joined our chat...").await;
    bob.expect_line("alice has joined our chat...").await;

    // when (操作):
    alice.send_line("hello").await;
    bob.expect_line(&format!("[{}][alice]: hello", TS)).await;
    drop(bob);
    alice.expect_line("bob has left our chat...").await;
    let log = server.stop().await;

    // then (期待する結果):
    assert_eq!(
        log,
        format!(
            "alice has joined our chat...\n\
             bob has joined our chat...\n\
             [{}][alice]: hello\n\
             bob has left our chat...\n",
            TS
        )
    );
}

#[tokio::test]
async fn test_racing_clients_with_same_name_admit_exactly_one() {
    // テスト項目: 同じ名前で同時に接続したクライアントのうち、ちょうど 1 つだけが受け入れられる
    // given (前提条件):
    let server = TestServer::start(10).await;
    let mut clients = Vec::new();
    for _ in 0..6 {
        let mut client = TestClient::connect(server.addr).await;
        client.read_greeting().await;
        clients.push(client);
    }

    // when (操作):
    for client in clients.iter_mut() {
        client.send_line("dup").await;
    }

    // then (期待する結果):
    let mut rejected = 0;
    for client in clients.iter_mut() {
        let mut line = String::new();
        let read = timeout(QUIET_PERIOD * 2, client.reader.read_line(&mut line)).await;
        if matches!(read, Ok(Ok(n)) if n > 0)
            && line.starts_with("Sorry! The name you are trying to enter is already in use.")
        {
            rejected += 1;
        }
    }
    assert_eq!(rejected, 5);
    server.wait_for_clients(1).await;
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    // テスト項目: 使用中のアドレスへのバインドは ServerError::Bind になる
    // given (前提条件):
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let registry = Arc::new(InMemoryClientRegistry::new(1));
    let log_dir = tempfile::tempdir().unwrap();
    let chat_log = Arc::new(
        FileChatLog::create(log_dir.path().join("chat_logs.txt"))
            .await
            .unwrap(),
    );
    let server = Server::new(
        ServerConfig::new("127.0.0.1", port),
        Arc::new(AdmitClientUseCase::new(registry.clone())),
        Arc::new(DisconnectClientUseCase::new(registry.clone())),
        Arc::new(BroadcastUseCase::new(registry, HistoryBuffer::unbounded())),
        chat_log,
        Arc::new(tcpchat_shared::time::SystemClock),
    );

    // when (操作):
    let result = server.bind().await;

    // then (期待する結果):
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
