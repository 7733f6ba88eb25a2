//! Storage backend capability shared by the local and object-storage variants.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Byte source handed to [`StorageBackend::put`]
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("target already exists: {0}")]
    AlreadyExists(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Object,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Object => "object",
        }
    }
}

/// Persists upload artifacts addressed by opaque storage keys.
///
/// Keys are produced by [`StorageBackend::generate_key`] and are only
/// meaningful to the backend that produced them.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Builds the key under which a new artifact will be stored
    fn generate_key(&self, owner_id: i64, category: &str, file_name: &str, timestamp: i64)
        -> String;

    /// Writes the whole stream at `key`, overwriting any existing artifact.
    ///
    /// Returns the number of bytes persisted. On error no partial artifact remains.
    async fn put(
        &self,
        key: &str,
        reader: ByteStream,
        content_type: &str,
    ) -> Result<u64, StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Removes the artifact; an absent key counts as success
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public locator for the artifact, or `Unavailable`
    fn resolve_url(&self, key: &str) -> Result<String, StorageError>;

    /// Moves the artifact to a new file name and returns the new key
    async fn rename(&self, key: &str, new_name: &str) -> Result<String, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
