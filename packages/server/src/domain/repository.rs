//! Client registry trait 定義
//!
//! 接続中クライアントの集合に対するインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{AdmissionError, Client, ClientName, ConnectionId};

/// Client Registry trait
///
/// 「現在誰が接続しているか」の唯一の情報源。
/// 実装は全ての操作を単一の排他制御の下で行い、以下の不変条件を保証する必要がある：
///
/// - エントリ数は `max_clients()` を超えない
/// - 同じ名前を持つエントリは 2 つ以上存在しない
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// クライアントを登録
    ///
    /// 名前の重複チェック・容量チェックと挿入はアトミックに行われる。
    /// 同じ名前や最後の空き枠を取り合う並行した登録は、片方だけが成功する。
    async fn insert(&self, client: Client) -> Result<(), AdmissionError>;

    /// クライアントを削除
    ///
    /// 存在しない場合は `None` を返す（冪等）。
    async fn remove(&self, id: &ConnectionId) -> Option<Client>;

    /// 全クライアントのコピーを取得
    ///
    /// ロックはコピー後に解放されるため、呼び出し側は I/O 中にロックを保持しない。
    async fn snapshot(&self) -> Vec<Client>;

    /// 接続中のクライアント数を取得
    async fn size(&self) -> usize;

    /// 指定した名前のクライアントが接続中かどうか
    async fn contains(&self, name: &ClientName) -> bool;

    /// 同時接続数の上限
    fn max_clients(&self) -> usize;
}
