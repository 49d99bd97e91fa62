//! クライアントレジストリの実装
//!
//! - `inmemory`: HashMap と単一の Mutex を使った実装

pub mod inmemory;

pub use inmemory::InMemoryClientRegistry;
