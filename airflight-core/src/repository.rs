use async_trait::async_trait;
use serde_json::Value;

use crate::keys::StorePath;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(String),
    #[error("Store rejected request with HTTP {status}")]
    Status { status: u16 },
    #[error("Malformed store response: {0}")]
    Malformed(String),
    #[error("Invalid store path: {0}")]
    InvalidPath(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Hierarchical document store the whole app state lives in.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the subtree at `path`. Absent locations read as `Value::Null`.
    async fn read(&self, path: &StorePath) -> StoreResult<Value>;

    /// Append `record` under `path` with a store-generated key and return that key.
    async fn push(&self, path: &StorePath, record: Value) -> StoreResult<String>;

    /// Write `record` at `path` only if nothing is there yet. Returns false when occupied.
    async fn create(&self, path: &StorePath, record: Value) -> StoreResult<bool>;

    /// Delete the subtree at `path`. Deleting an absent location succeeds.
    async fn remove(&self, path: &StorePath) -> StoreResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Device-local key-value storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}
