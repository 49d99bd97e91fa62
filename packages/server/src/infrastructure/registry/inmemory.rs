//! InMemory Client Registry 実装
//!
//! ドメイン層が定義する ClientRegistry trait の具体的な実装。
//! ConnectionId をキーとする HashMap を単一の Mutex で保護します。
//!
//! 名前の重複チェック・容量チェック・挿入は同じロックの中で行うため、
//! 並行した登録が同時に成功して不変条件を破ることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AdmissionError, Client, ClientName, ClientRegistry, ConnectionId};

/// インメモリ Client Registry 実装
pub struct InMemoryClientRegistry {
    /// 接続中のクライアント
    ///
    /// Key: ConnectionId
    /// Value: Client
    clients: Mutex<HashMap<ConnectionId, Client>>,
    /// 同時接続数の上限
    max_clients: usize,
}

impl InMemoryClientRegistry {
    /// 新しい InMemoryClientRegistry を作成
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_clients,
        }
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn insert(&self, client: Client) -> Result<(), AdmissionError> {
        let mut clients = self.clients.lock().await;

        if clients.values().any(|c| c.name() == client.name()) {
            return Err(AdmissionError::NameTaken(client.name().as_str().to_string()));
        }
        if clients.len() >= self.max_clients {
            return Err(AdmissionError::CapacityExceeded);
        }

        tracing::debug!(
            "Client '{}' ({}) registered as {}",
            client.name(),
            client.origin(),
            client.id()
        );
        clients.insert(*client.id(), client);
        Ok(())
    }

    async fn remove(&self, id: &ConnectionId) -> Option<Client> {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(id);
        if let Some(client) = &removed {
            tracing::debug!("Client '{}' unregistered ({})", client.name(), id);
        }
        removed
    }

    async fn snapshot(&self) -> Vec<Client> {
        let clients = self.clients.lock().await;
        clients.values().cloned().collect()
    }

    async fn size(&self) -> usize {
        let clients = self.clients.lock().await;
        clients.len()
    }

    async fn contains(&self, name: &ClientName) -> bool {
        let clients = self.clients.lock().await;
        clients.values().any(|c| c.name() == name)
    }

    fn max_clients(&self) -> usize {
        self.max_clients
    }
}
