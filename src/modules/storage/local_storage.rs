//! Local filesystem storage.
//!
//! Artifacts live at `{root}/uploads/{category}/{timestamp}_{name}` and the
//! storage key is that absolute path.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{BackendKind, ByteStream, StorageBackend, StorageError};
use crate::shared::validation::sanitize_file_name;

const UPLOADS_DIR: &str = "uploads";

/// URL prefix the uploads directory is served under
pub const PUBLIC_UPLOADS_PREFIX: &str = "/uploads";

pub struct LocalStorage {
    root: PathBuf,
    uploads_dir: PathBuf,
}

impl LocalStorage {
    /// Creates a backend rooted at `base`, made absolute and normalized.
    ///
    /// Directories are created lazily on first write.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(StorageError::InvalidKey(
                "storage path cannot be empty".to_string(),
            ));
        }

        let absolute = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()?.join(base)
        };
        let root = normalize(&absolute);
        let uploads_dir = root.join(UPLOADS_DIR);

        Ok(Self { root, uploads_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory served at [`PUBLIC_UPLOADS_PREFIX`]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Maps a key back to a path, refusing anything outside the uploads directory
    fn resolve_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(key);
        if !path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
            || !path.starts_with(&self.uploads_dir)
            || path == self.uploads_dir
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(path.to_path_buf())
    }
}

/// Collapses `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Removes an unfinished temporary file unless disarmed.
///
/// Runs on drop so a cancelled write (e.g. a timed-out upload) is cleaned up too.
struct PartFile {
    path: Option<PathBuf>,
}

impl PartFile {
    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial upload {}: {}", path.display(), e);
                }
            }
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn generate_key(
        &self,
        _owner_id: i64,
        category: &str,
        file_name: &str,
        timestamp: i64,
    ) -> String {
        self.uploads_dir
            .join(sanitize_file_name(category))
            .join(format!("{}_{}", timestamp, sanitize_file_name(file_name)))
            .to_string_lossy()
            .into_owned()
    }

    async fn put(
        &self,
        key: &str,
        mut reader: ByteStream,
        _content_type: &str,
    ) -> Result<u64, StorageError> {
        let path = self.resolve_path(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent).await?;

        let part_path = parent.join(format!(".{}.part", Uuid::new_v4()));
        let mut guard = PartFile {
            path: Some(part_path.clone()),
        };

        let mut file = fs::File::create(&part_path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&part_path, &path).await?;
        guard.disarm();

        debug!("Stored {} bytes at {}", written, path.display());
        Ok(written)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_url(&self, key: &str) -> Result<String, StorageError> {
        let path = self.resolve_path(key)?;
        let relative = path
            .strip_prefix(&self.uploads_dir)
            .map_err(|_| StorageError::InvalidKey(key.to_string()))?;

        let segments: Vec<String> = relative
            .components()
            .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
            .collect();

        Ok(format!("{}/{}", PUBLIC_UPLOADS_PREFIX, segments.join("/")))
    }

    async fn rename(&self, key: &str, new_name: &str) -> Result<String, StorageError> {
        let path = self.resolve_path(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;

        // Keep the timestamp prefix so renamed artifacts stay collision-free
        let current = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let safe_name = sanitize_file_name(new_name);
        let file_name = match current.split_once('_') {
            Some((ts, _)) if !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()) => {
                format!("{}_{}", ts, safe_name)
            }
            _ => safe_name,
        };

        let target = parent.join(file_name);
        if target == path {
            return Ok(key.to_string());
        }
        if fs::try_exists(&target).await? {
            return Err(StorageError::AlreadyExists(
                target.to_string_lossy().into_owned(),
            ));
        }

        match fs::rename(&path, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Renamed {} to {}", path.display(), target.display());
        Ok(target.to_string_lossy().into_owned())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
