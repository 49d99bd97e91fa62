//! テキストファイルを使った ChatLog 実装
//!
//! ## 責務
//!
//! - 起動時にログファイルを作り直す（前回のログは残さない）
//! - 1 イベント 1 行で追記し、書き込みごとに flush と sync を行う
//!
//! 書き込みはパイプラインワーカーからのみ行われるため、
//! ファイルの行順はブロードキャスト順と一致します。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

use crate::domain::{ChatLog, ChatLogError};

/// ファイルへ追記する ChatLog
pub struct FileChatLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileChatLog {
    /// ログファイルを作成（既存の内容は破棄）
    ///
    /// # Errors
    ///
    /// ファイルを開けない場合は `ChatLogError::Io` を返す
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, ChatLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;
        tracing::info!("Chat log opened at {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ChatLog for FileChatLog {
    async fn append(&self, line: &str) -> Result<(), ChatLogError> {
        let mut file = self.file.lock().await;
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), ChatLogError> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}
