//! UseCase: クライアントの切断処理
//!
//! Registry からクライアントを削除します。削除は冪等で、既に削除済みの場合は
//! `None` を返すため、呼び出し側は退出通知を重複して送ることがありません。

use std::sync::Arc;

use crate::domain::{Client, ClientRegistry, ConnectionId};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Registry（接続中クライアント集合の抽象化）
    registry: Arc<dyn ClientRegistry>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// クライアント切断を実行
    ///
    /// # Returns
    ///
    /// * `Some(Client)` - 今回の呼び出しで削除されたクライアント
    /// * `None` - 既に削除済み（何もしない）
    pub async fn execute(&self, id: &ConnectionId) -> Option<Client> {
        self.registry.remove(id).await
    }
}
