//! チャットログ（追記専用シンク）の実装
//!
//! - `file`: テキストファイルへの追記

pub mod file;

pub use file::FileChatLog;
