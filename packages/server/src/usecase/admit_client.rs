//! UseCase: クライアントの受け入れ（Admission）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AdmitClientUseCase::execute() メソッド
//! - 名前の検証、重複チェック、容量チェック
//!
//! ### なぜこのテストが必要か
//! - 受け入れに成功したクライアントだけがブロードキャスト対象になる
//! - 拒否理由ごとに異なるメッセージをクライアントへ返す必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規クライアントの受け入れ
//! - 異常系：空の名前、重複した名前、容量超過

use std::sync::Arc;

use crate::domain::{
    AdmissionError, Client, ClientName, ClientRegistry, ConnectionId, OutboxChannel,
};

/// A connection that has sent its name but is not yet an active client
#[derive(Debug)]
pub struct ClientCandidate {
    pub id: ConnectionId,
    /// The first line the peer sent, untrimmed
    pub requested_name: String,
    pub origin: String,
    pub outbox: OutboxChannel,
}

/// クライアント受け入れのユースケース
pub struct AdmitClientUseCase {
    /// Registry（接続中クライアント集合の抽象化）
    registry: Arc<dyn ClientRegistry>,
}

impl AdmitClientUseCase {
    /// 新しい AdmitClientUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// クライアント受け入れを実行
    ///
    /// # Returns
    ///
    /// * `Ok(Client)` - Registry に登録されたクライアント
    /// * `Err(AdmissionError)` - 空の名前 / 名前の重複 / 容量超過
    pub async fn execute(&self, candidate: ClientCandidate) -> Result<Client, AdmissionError> {
        // 1. 名前の検証（前後の空白を除去し、空なら拒否）
        let name = ClientName::new(&candidate.requested_name)?;

        // 2. Registry に登録（重複チェック・容量チェックは Registry のロック内で行われる）
        let client = Client::new(candidate.id, name, candidate.origin, candidate.outbox);
        self.registry.insert(client.clone()).await?;

        Ok(client)
    }

    /// 空き枠があるかどうか
    ///
    /// 拘束力のない事前チェック。確定的な判定は `execute` が行う。
    pub async fn has_capacity(&self) -> bool {
        self.registry.size().await < self.registry.max_clients()
    }
}
