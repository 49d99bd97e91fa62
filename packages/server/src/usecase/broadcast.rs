//! UseCase: ブロードキャストと履歴のリプレイ
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastUseCase::broadcast() と admit_with_replay()
//!
//! ### なぜこのテストが必要か
//! - 送信者自身にはメッセージが届かないこと（除外）を保証する
//! - 一部の宛先への送信失敗が他の宛先への配送を止めないことを確認
//! - 新規クライアントが過去のメッセージを順番通り、重複も欠落もなく受け取ることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数クライアントへのブロードキャスト、履歴のリプレイ
//! - 異常系：書き込みタスクが停止したクライアントへの配送、outbox が満杯のクライアントへの配送
//! - エッジケース：受け入れを拒否されたクライアントにはリプレイしない
//!
//! ## ロック順序
//!
//! 履歴のロック → Registry のロック。ブロードキャストは履歴への追加と
//! Registry のスナップショット取得を、受け入れは Registry への登録と
//! 履歴のコピーを、どちらも履歴のロックを保持したまま行う。

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{AdmissionError, Client, ClientRegistry, ConnectionId, HistoryBuffer};

use super::admit_client::{AdmitClientUseCase, ClientCandidate};

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose outbox accepted the line
    pub delivered: usize,
    /// Recipients whose outbox was full; the line is lost for them
    pub dropped: usize,
    /// Recipients whose writer had already stopped
    pub failed: usize,
}

/// ブロードキャストとリプレイのユースケース
pub struct BroadcastUseCase {
    /// Registry（接続中クライアント集合の抽象化）
    registry: Arc<dyn ClientRegistry>,
    /// これまでにブロードキャストされたメッセージ
    history: Mutex<HistoryBuffer>,
}

impl BroadcastUseCase {
    /// 新しい BroadcastUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>, history: HistoryBuffer) -> Self {
        Self {
            registry,
            history: Mutex::new(history),
        }
    }

    /// `text` を履歴に追加し、`exclude` 以外の全クライアントへ配送する
    ///
    /// outbox が満杯の宛先や書き込みタスクが停止した宛先はログに記録して
    /// スキップする（部分配送を許容）。他の宛先への配送を待たせることはない。
    pub async fn broadcast(&self, text: &str, exclude: &ConnectionId) -> BroadcastReport {
        let targets = {
            let mut history = self.history.lock().await;
            history.push(text.to_string());
            self.registry.snapshot().await
        };

        let mut report = BroadcastReport::default();
        for client in targets.iter().filter(|c| c.id() != exclude) {
            match client.push(text) {
                Ok(()) => {
                    report.delivered += 1;
                    tracing::debug!("Broadcasted message to client '{}'", client.name());
                }
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::warn!("Outbox of client '{}' is full, message dropped", client.name());
                }
                Err(TrySendError::Closed(_)) => {
                    report.failed += 1;
                    tracing::warn!("Failed to push message to client '{}': writer stopped", client.name());
                }
            }
        }

        report
    }

    /// クライアントを受け入れ、これまでの履歴を新しいクライアントの outbox に積む
    ///
    /// 受け入れと履歴のコピーは履歴のロックを保持したまま行われるため、
    /// 並行するブロードキャストの各メッセージはリプレイかライブ配送の
    /// どちらか一方でちょうど一度だけ届き、リプレイは常にライブ配送より先になる。
    /// outbox に収まらない分のリプレイは打ち切られる。
    pub async fn admit_with_replay(
        &self,
        admission: &AdmitClientUseCase,
        candidate: ClientCandidate,
    ) -> Result<Client, AdmissionError> {
        let history = self.history.lock().await;
        let client = admission.execute(candidate).await?;

        let mut replayed = 0;
        for line in history.iter() {
            if let Err(e) = client.push(line) {
                tracing::warn!("Replay to client '{}' cut short: {}", client.name(), e);
                break;
            }
            replayed += 1;
        }
        tracing::debug!(
            "Replayed {} history line(s) to client '{}'",
            replayed,
            client.name()
        );

        Ok(client)
    }

    /// 現在の履歴のコピー
    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.snapshot()
    }
}
