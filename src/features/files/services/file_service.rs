use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::FileResponseDto;
use crate::features::files::models::{FileCategory, FileRecord, NewFileRecord};
use crate::features::files::repositories::{FileRepository, FileTransaction};
use crate::modules::storage::{ByteStream, StorageBackend, StorageError};
use crate::shared::validation::{
    file_extension, sanitize_keeping_extension, validate_extension, validate_file_name,
    validate_file_upload, validate_id, FileHeader,
};

/// Limits applied by the orchestrator
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_upload_size: u64,
    /// Empty selects the built-in allow-list
    pub allowed_extensions: &'static [&'static str],
    pub upload_timeout: Duration,
    pub operation_timeout: Duration,
}

impl UploadSettings {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_upload_size: config.max_upload_size,
            allowed_extensions: &[],
            upload_timeout: config.upload_timeout(),
            operation_timeout: config.operation_timeout(),
        }
    }
}

/// Timestamps tried per upload before giving up on a free storage key
const MAX_KEY_ATTEMPTS: i64 = 16;

/// One incoming upload
pub struct UploadRequest {
    pub owner_id: i64,
    pub file_name: String,
    pub declared_size: u64,
    pub content_type: String,
    pub reader: ByteStream,
}

/// Couples file metadata rows with their backend artifacts.
///
/// Artifacts are written before the row is inserted and removed again when
/// the row does not become durable, so a committed row always has an artifact.
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    storage: Arc<dyn StorageBackend>,
    settings: UploadSettings,
    /// Keys claimed by uploads that have not committed or cleaned up yet
    pending_keys: Arc<Mutex<HashSet<String>>>,
    /// Milliseconds since the epoch, used in storage keys
    clock: fn() -> i64,
}

impl FileService {
    pub fn new(
        repository: Arc<dyn FileRepository>,
        storage: Arc<dyn StorageBackend>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            repository,
            storage,
            settings,
            pending_keys: Arc::new(Mutex::new(HashSet::new())),
            clock: || Utc::now().timestamp_millis(),
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_upload_size(&self) -> u64 {
        self.settings.max_upload_size
    }

    /// Validate, store, and record an upload.
    ///
    /// Every failure after the artifact write removes the artifact before
    /// returning. A panic or cancellation drops the open transaction (rolling it
    /// back) and the artifact guard (scheduling the removal).
    pub async fn upload(&self, request: UploadRequest) -> Result<FileRecord> {
        let UploadRequest {
            owner_id,
            file_name,
            declared_size,
            content_type,
            reader,
        } = request;

        validate_file_upload(
            Some(&FileHeader {
                name: &file_name,
                size: declared_size,
            }),
            self.settings.max_upload_size,
            self.settings.allowed_extensions,
        )?;

        let extension = file_extension(&file_name);
        let file_name = sanitize_keeping_extension(&file_name);
        let category = FileCategory::from_extension(&extension);

        let mut tx = self
            .repository
            .begin()
            .await
            .map_err(|e| transaction_failure("begin", e))?;

        let claim = match self.claim_key(owner_id, category, &file_name).await {
            Ok(claim) => claim,
            Err(e) => {
                abort(tx).await;
                return Err(e);
            }
        };
        let storage_key = claim.key.clone();
        let mut guard = ArtifactGuard::arm(
            Arc::clone(&self.storage),
            claim,
            self.settings.operation_timeout,
        );

        let new_record = NewFileRecord {
            user_id: owner_id,
            file_name,
            storage_key,
            file_size: declared_size as i64,
            mime_type: content_type,
            extension,
            category,
        };

        let record = match self
            .store_and_insert(tx.as_mut(), &new_record, reader, declared_size)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                guard.cleanup().await;
                abort(tx).await;
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            guard.cleanup().await;
            return Err(transaction_failure("commit", e));
        }
        guard.disarm();

        info!(
            "File uploaded: id={}, name={}, size={}, category={}, user_id={}",
            record.id, record.file_name, record.file_size, record.category, record.user_id
        );

        Ok(record)
    }

    /// Picks a storage key no other artifact or in-flight upload uses.
    ///
    /// Keys embed a millisecond timestamp; on a clash the timestamp is bumped.
    async fn claim_key(
        &self,
        owner_id: i64,
        category: FileCategory,
        file_name: &str,
    ) -> Result<KeyClaim> {
        let timestamp = (self.clock)();

        for attempt in 0..MAX_KEY_ATTEMPTS {
            let key = self.storage.generate_key(
                owner_id,
                category.as_str(),
                file_name,
                timestamp + attempt,
            );
            let Some(claim) = KeyClaim::try_claim(&self.pending_keys, &key) else {
                continue;
            };

            match bounded(
                self.settings.operation_timeout,
                &key,
                self.storage.exists(&key),
            )
            .await
            {
                Ok(false) => return Ok(claim),
                Ok(true) => debug!("Storage key {} already holds an artifact", key),
                Err(e) => return Err(storage_failure(&key, e)),
            }
        }

        Err(AppError::Conflict(format!(
            "No free storage key for {} after {} attempts",
            file_name, MAX_KEY_ATTEMPTS
        )))
    }

    /// Writes the artifact, checks its size, then inserts the row inside `tx`
    async fn store_and_insert(
        &self,
        tx: &mut dyn FileTransaction,
        record: &NewFileRecord,
        reader: ByteStream,
        declared_size: u64,
    ) -> Result<FileRecord> {
        // One byte past the declared size is enough to detect an overlong stream
        let reader: ByteStream = Box::new(reader.take(declared_size.saturating_add(1)));

        let written = bounded(
            self.settings.upload_timeout,
            &record.storage_key,
            self.storage.put(&record.storage_key, reader, &record.mime_type),
        )
        .await
        .map_err(|e| storage_failure(&record.storage_key, e))?;

        if written != declared_size {
            return Err(AppError::Validation(format!(
                "file size mismatch: declared {} bytes, received {} bytes",
                declared_size, written
            )));
        }

        Ok(tx.insert(record).await?)
    }

    /// Soft-delete a visible record, then remove its artifacts.
    ///
    /// The row deletion is authoritative; artifact removal failures are only logged.
    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<()> {
        validate_id(id, "file id")?;
        validate_id(owner_id, "user id")?;

        let mut tx = self
            .repository
            .begin()
            .await
            .map_err(|e| transaction_failure("begin", e))?;

        let record = match tx.find_visible_for_update(id, owner_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                abort(tx).await;
                return Err(file_not_found());
            }
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };

        match tx.soft_delete(record.id).await {
            Ok(0) => {
                abort(tx).await;
                return Err(file_not_found());
            }
            Ok(_) => {}
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        }

        tx.commit()
            .await
            .map_err(|e| transaction_failure("commit", e))?;

        let deadline = self.settings.operation_timeout;
        remove_artifact(self.storage.as_ref(), &record.storage_key, deadline).await;
        if let Some(thumbnail_key) = record.thumbnail_key.as_deref() {
            remove_artifact(self.storage.as_ref(), thumbnail_key, deadline).await;
        }

        info!("File deleted: id={}, user_id={}", record.id, owner_id);
        Ok(())
    }

    /// Rename a visible record and its artifact.
    ///
    /// A new name without an extension keeps the current one. A new extension
    /// must pass the allow-list and re-derives the category.
    pub async fn rename(&self, id: i64, owner_id: i64, new_name: &str) -> Result<FileRecord> {
        validate_id(id, "file id")?;
        validate_file_name(new_name)?;

        let mut new_name = sanitize_keeping_extension(new_name);

        let mut tx = self
            .repository
            .begin()
            .await
            .map_err(|e| transaction_failure("begin", e))?;

        let record = match tx.find_visible_for_update(id, owner_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                abort(tx).await;
                return Err(file_not_found());
            }
            Err(e) => {
                abort(tx).await;
                return Err(e.into());
            }
        };

        let mut extension = file_extension(&new_name);
        if extension.is_empty() {
            new_name.push_str(&record.extension);
            extension = record.extension.clone();
        } else if extension != record.extension {
            if let Err(e) = validate_extension(&extension, self.settings.allowed_extensions) {
                abort(tx).await;
                return Err(e.into());
            }
        }

        if new_name == record.file_name {
            abort(tx).await;
            return Ok(record);
        }

        let new_key = match bounded(
            self.settings.operation_timeout,
            &record.storage_key,
            self.storage.rename(&record.storage_key, &new_name),
        )
        .await
        {
            Ok(key) => key,
            Err(e) => {
                abort(tx).await;
                return Err(rename_failure(&record.storage_key, e));
            }
        };

        let category = FileCategory::from_extension(&extension);
        let updated = match tx
            .update_name(record.id, &new_name, &new_key, &extension, category)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                abort(tx).await;
                self.revert_rename(&new_key, &record).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tx.commit().await {
            self.revert_rename(&new_key, &record).await;
            return Err(transaction_failure("commit", e));
        }

        info!(
            "File renamed: id={}, from={}, to={}",
            updated.id, record.file_name, updated.file_name
        );
        Ok(updated)
    }

    async fn revert_rename(&self, new_key: &str, original: &FileRecord) {
        if new_key == original.storage_key {
            return;
        }
        match bounded(
            self.settings.operation_timeout,
            new_key,
            self.storage.rename(new_key, &original.file_name),
        )
        .await
        {
            Ok(_) => debug!("Reverted rename of {}", new_key),
            Err(e) => warn!(
                "Failed to revert rename of {} back to {}: {}",
                new_key, original.storage_key, e
            ),
        }
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        Ok(self.repository.list_visible(owner_id, None).await?)
    }

    pub async fn list_by_category(
        &self,
        category: FileCategory,
        owner_id: i64,
    ) -> Result<Vec<FileRecord>> {
        Ok(self
            .repository
            .list_visible(owner_id, Some(category))
            .await?)
    }

    pub async fn get(&self, id: i64, owner_id: i64) -> Result<FileRecord> {
        validate_id(id, "file id")?;
        self.repository
            .find_visible(id, owner_id)
            .await?
            .ok_or_else(file_not_found)
    }

    /// Visible record plus the artifact bytes from the active backend
    pub async fn download(&self, id: i64, owner_id: i64) -> Result<(FileRecord, Vec<u8>)> {
        let record = self.get(id, owner_id).await?;

        let bytes = bounded(
            self.settings.operation_timeout,
            &record.storage_key,
            self.storage.get(&record.storage_key),
        )
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound("File content not found".to_string()),
            other => storage_failure(&record.storage_key, other),
        })?;

        Ok((record, bytes))
    }

    pub fn to_response(&self, record: &FileRecord) -> FileResponseDto {
        let url = self
            .storage
            .resolve_url(&record.storage_key)
            .unwrap_or_else(|_| format!("/api/files/download/{}", record.id));

        FileResponseDto {
            id: record.id,
            file_name: record.file_name.clone(),
            file_size: record.file_size,
            file_type: record.mime_type.clone(),
            extension: record.extension.clone(),
            category: record.category(),
            url,
            created_at: record.created_at,
        }
    }
}

/// Exclusive hold on a storage key for the lifetime of one upload
struct KeyClaim {
    pending: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl KeyClaim {
    fn try_claim(pending: &Arc<Mutex<HashSet<String>>>, key: &str) -> Option<Self> {
        if !lock_pending(pending).insert(key.to_string()) {
            return None;
        }
        Some(Self {
            pending: Arc::clone(pending),
            key: key.to_string(),
        })
    }
}

impl Drop for KeyClaim {
    fn drop(&mut self) {
        lock_pending(&self.pending).remove(&self.key);
    }
}

fn lock_pending(pending: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes an uploaded artifact unless disarmed.
///
/// `cleanup` removes it inline; dropping an armed guard (panic, cancelled
/// request) schedules the removal on the runtime instead. The key claim is
/// released only once the artifact is gone.
struct ArtifactGuard {
    storage: Arc<dyn StorageBackend>,
    claim: Option<KeyClaim>,
    deadline: Duration,
}

impl ArtifactGuard {
    fn arm(storage: Arc<dyn StorageBackend>, claim: KeyClaim, deadline: Duration) -> Self {
        Self {
            storage,
            claim: Some(claim),
            deadline,
        }
    }

    /// The artifact is committed; its presence now keeps the key taken
    fn disarm(&mut self) {
        self.claim = None;
    }

    async fn cleanup(mut self) {
        if let Some(claim) = self.claim.take() {
            remove_artifact(self.storage.as_ref(), &claim.key, self.deadline).await;
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if let Some(claim) = self.claim.take() {
            let storage = Arc::clone(&self.storage);
            let deadline = self.deadline;
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        remove_artifact(storage.as_ref(), &claim.key, deadline).await;
                        drop(claim);
                    });
                }
                Err(_) => warn!("No runtime available to remove artifact {}", claim.key),
            }
        }
    }
}

async fn remove_artifact(storage: &dyn StorageBackend, key: &str, deadline: Duration) {
    match tokio::time::timeout(deadline, storage.delete(key)).await {
        Ok(Ok(())) => debug!("Removed artifact {}", key),
        Ok(Err(e)) => warn!("Failed to remove artifact {}: {}", key, e),
        Err(_) => warn!("Timed out removing artifact {} after {:?}", key, deadline),
    }
}

/// Runs a backend call under a deadline; expiry reads as `Unavailable`
async fn bounded<T, F>(
    deadline: Duration,
    key: &str,
    op: F,
) -> std::result::Result<T, StorageError>
where
    F: Future<Output = std::result::Result<T, StorageError>>,
{
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Unavailable(format!(
            "operation on '{}' timed out after {:?}",
            key, deadline
        ))),
    }
}

async fn abort(tx: Box<dyn FileTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!("Transaction rollback failed: {}", e);
    }
}

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

fn transaction_failure(stage: &str, err: sqlx::Error) -> AppError {
    AppError::Transaction(format!("{} failed: {}", stage, err))
}

fn storage_failure(key: &str, err: StorageError) -> AppError {
    AppError::Storage(format!("{} ({})", err, key))
}

fn rename_failure(key: &str, err: StorageError) -> AppError {
    match err {
        StorageError::Unsupported(_) => AppError::BadRequest(
            "Rename is not supported by the active storage backend".to_string(),
        ),
        StorageError::AlreadyExists(_) => {
            AppError::Conflict("A file with that name already exists".to_string())
        }
        StorageError::NotFound(_) => AppError::NotFound("File content not found".to_string()),
        other => storage_failure(key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::repositories::MemoryFileRepository;
    use crate::modules::storage::{BackendKind, LocalStorage};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    struct Harness {
        _dir: TempDir,
        repo: MemoryFileRepository,
        local: Arc<LocalStorage>,
        service: FileService,
    }

    fn settings(max_upload_size: u64) -> UploadSettings {
        UploadSettings {
            max_upload_size,
            allowed_extensions: &[],
            upload_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5),
        }
    }

    fn harness_with(settings: UploadSettings) -> Harness {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(LocalStorage::new(dir.path()).unwrap());
        let repo = MemoryFileRepository::new();
        let service = FileService::new(
            Arc::new(repo.clone()),
            local.clone() as Arc<dyn StorageBackend>,
            settings,
        );
        Harness {
            _dir: dir,
            repo,
            local,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(settings(100))
    }

    fn request(owner_id: i64, name: &str, declared_size: u64, body: &'static [u8]) -> UploadRequest {
        UploadRequest {
            owner_id,
            file_name: name.to_string(),
            declared_size,
            content_type: "text/plain".to_string(),
            reader: Box::new(body),
        }
    }

    /// Regular files under `dir`, recursively
    fn artifact_count(dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        entries
            .flatten()
            .map(|entry| {
                let path = entry.path();
                if path.is_dir() {
                    artifact_count(&path)
                } else {
                    1
                }
            })
            .sum()
    }

    #[tokio::test]
    async fn test_upload_stores_artifact_and_row() {
        let h = harness();

        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        assert_eq!(record.category, "document");
        assert_eq!(record.extension, ".txt");
        assert_eq!(record.file_size, 10);
        assert_eq!(record.user_id, 3);

        let bytes = h.local.get(&record.storage_key).await.unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(h.repo.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_keeps_validated_extension_through_sanitizing() {
        let h = harness();

        let record = h
            .service
            .upload(request(3, "report..pdf", 4, b"%PDF"))
            .await
            .unwrap();
        assert_eq!(record.file_name, "report.pdf");
        assert_eq!(record.extension, ".pdf");
        assert_eq!(record.category(), FileCategory::Document);

        let record = h.service.upload(request(3, "..txt", 3, b"abc")).await.unwrap();
        assert_eq!(record.file_name, "file.txt");
        assert_eq!(record.extension, ".txt");
        assert!(record.storage_key.ends_with("_file.txt"));
    }

    #[tokio::test]
    async fn test_same_millisecond_uploads_get_distinct_keys() {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(LocalStorage::new(dir.path()).unwrap());
        let repo = MemoryFileRepository::new();
        let service = FileService::new(
            Arc::new(repo.clone()),
            local.clone() as Arc<dyn StorageBackend>,
            settings(100),
        )
        .with_clock(|| 1_700_000_000_000);

        let first = service.upload(request(3, "same.txt", 4, b"AAAA")).await.unwrap();
        let (second, third) = tokio::join!(
            service.upload(request(3, "same.txt", 4, b"BBBB")),
            service.upload(request(3, "same.txt", 4, b"CCCC"))
        );
        let (second, third) = (second.unwrap(), third.unwrap());

        let keys: HashSet<&str> = [&first, &second, &third]
            .into_iter()
            .map(|r| r.storage_key.as_str())
            .collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(artifact_count(local.uploads_dir()), 3);
        assert_eq!(local.get(&first.storage_key).await.unwrap(), b"AAAA");

        assert_ok!(service.delete(second.id, 3).await);
        assert_eq!(local.get(&first.storage_key).await.unwrap(), b"AAAA");
        assert!(local.exists(&third.storage_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_touch_existing_artifact_with_same_name() {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(LocalStorage::new(dir.path()).unwrap());
        let repo = MemoryFileRepository::new();
        let service = FileService::new(
            Arc::new(repo.clone()),
            local.clone() as Arc<dyn StorageBackend>,
            settings(100),
        )
        .with_clock(|| 1_700_000_000_000);

        let kept = service.upload(request(3, "same.txt", 4, b"AAAA")).await.unwrap();
        let result = service.upload(request(3, "same.txt", 8, b"BBBB")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(local.get(&kept.storage_key).await.unwrap(), b"AAAA");
        assert_eq!(artifact_count(local.uploads_dir()), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_extension_without_side_effects() {
        let h = harness();

        let err = h
            .service
            .upload(request(3, "a.exe", 4, b"MZ\0\0"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("invalid file type")));
        assert!(h.repo.rows().is_empty());
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_oversize_declaration() {
        let h = harness();

        let err = h
            .service
            .upload(request(3, "big.txt", 101, b"x"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::Validation(ref msg) if msg == "file exceeds maximum size of 100 bytes")
        );
        assert!(h.repo.rows().is_empty());
        assert!(!h.local.uploads_dir().exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_traversal_names_before_touching_storage() {
        let h = harness();

        for name in ["../etc/passwd.txt", "..\\boot.ini.txt", "a\0.txt"] {
            let result = h.service.upload(request(3, name, 3, b"abc")).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{name}");
        }
        assert!(!h.local.uploads_dir().exists());
        assert!(h.repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_short_stream_fails_and_removes_artifact() {
        let h = harness();

        let err = h
            .service
            .upload(request(3, "short.txt", 50, &[b'a'; 40]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("size mismatch")));
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
        assert!(h.repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_stream_fails_and_removes_artifact() {
        let h = harness();

        let result = h.service.upload(request(3, "long.txt", 5, b"0123456789")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_removes_artifact() {
        let h = harness();
        h.repo.fail_commits(true);

        let err = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transaction(_)));
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
        assert!(h.repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_removes_artifact() {
        let h = harness();
        h.repo.fail_inserts(true);

        let err = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
    }

    #[tokio::test]
    async fn test_stalled_upload_times_out_and_leaves_nothing() {
        let h = harness_with(UploadSettings {
            upload_timeout: Duration::from_millis(50),
            ..settings(100)
        });
        // Writer half stays open, so the reader never reaches EOF
        let (_writer, reader) = tokio::io::duplex(64);

        let err = h
            .service
            .upload(UploadRequest {
                owner_id: 3,
                file_name: "slow.txt".to_string(),
                declared_size: 10,
                content_type: "text/plain".to_string(),
                reader: Box::new(reader),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(ref msg) if msg.contains("timed out")));
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
        assert!(h.repo.rows().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_artifact() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        assert_ok!(h.service.delete(record.id, 3).await);

        let lookup = h.service.get(record.id, 3).await;
        assert!(matches!(lookup, Err(AppError::NotFound(_))));
        assert!(!h.local.exists(&record.storage_key).await.unwrap());

        let row = h.repo.rows().into_iter().find(|r| r.id == record.id).unwrap();
        assert!(row.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_thumbnail_too() {
        let h = harness();
        let key = h.local.generate_key(3, "media", "photo.png", 1);
        let thumbnail = h.local.generate_key(3, "media", "photo_thumb.png", 1);
        h.local.put(&key, Box::new(&b"png"[..]), "image/png").await.unwrap();
        h.local
            .put(&thumbnail, Box::new(&b"thumb"[..]), "image/png")
            .await
            .unwrap();
        let record = h
            .repo
            .seed_with_thumbnail(3, "photo.png", &key, Some(&thumbnail));

        assert_ok!(h.service.delete(record.id, 3).await);

        assert!(!h.local.exists(&key).await.unwrap());
        assert!(!h.local.exists(&thumbnail).await.unwrap());
        assert_eq!(artifact_count(h.local.uploads_dir()), 0);
    }

    #[tokio::test]
    async fn test_delete_of_foreign_record_is_not_found() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let err = h.service.delete(record.id, 4).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.local.exists(&record.storage_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_rejects_zero_ids() {
        let h = harness();
        assert_err!(h.service.delete(0, 3).await);
        assert_err!(h.service.delete(1, 0).await);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_succeed_once() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            h.service.delete(record.id, 3),
            h.service.delete(record.id, 3)
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::NotFound(_))))
                .count(),
            1
        );
        let deleted = h
            .repo
            .rows()
            .into_iter()
            .filter(|r| r.deleted_at.is_some())
            .count();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_list_applies_visibility_rule() {
        let h = harness();
        h.repo.seed(5, "mine.txt", "k1");
        h.repo.seed(0, "shared.txt", "k2");
        h.repo.seed(9, "theirs.txt", "k3");

        let visible = h.service.list(5).await.unwrap();
        let mut owners: Vec<i64> = visible.iter().map(|r| r.user_id).collect();
        owners.sort();
        assert_eq!(owners, vec![0, 5]);
    }

    #[tokio::test]
    async fn test_list_by_category_filters() {
        let h = harness();
        h.repo.seed(5, "photo.png", "k1");
        h.repo.seed(5, "main.rs", "k2");

        let code = h
            .service
            .list_by_category(FileCategory::Code, 5)
            .await
            .unwrap();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].file_name, "main.rs");
    }

    #[tokio::test]
    async fn test_download_returns_bytes_or_not_found() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let (found, bytes) = h.service.download(record.id, 3).await.unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(bytes, b"0123456789");

        h.local.delete(&record.storage_key).await.unwrap();
        let err = h.service.download(record.id, 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "File content not found"));
    }

    #[tokio::test]
    async fn test_to_response_uses_backend_url() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let response = h.service.to_response(&record);
        assert!(response.url.starts_with("/uploads/document/"));
        assert_eq!(response.category, FileCategory::Document);
        assert_eq!(response.file_type, "text/plain");
    }

    #[tokio::test]
    async fn test_to_response_falls_back_to_download_path() {
        let h = harness();
        let record = h.repo.seed(3, "notes.txt", "not-a-local-key");

        let response = h.service.to_response(&record);
        assert_eq!(response.url, format!("/api/files/download/{}", record.id));
    }

    #[tokio::test]
    async fn test_rename_keeps_extension_when_omitted() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let renamed = h.service.rename(record.id, 3, "plan").await.unwrap();

        assert_eq!(renamed.file_name, "plan.txt");
        assert_eq!(renamed.extension, ".txt");
        assert!(renamed.storage_key.ends_with("_plan.txt"));
        assert!(h.local.exists(&renamed.storage_key).await.unwrap());
        assert!(!h.local.exists(&record.storage_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_with_new_extension_reclassifies() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let renamed = h.service.rename(record.id, 3, "notes.md").await.unwrap();
        assert_eq!(renamed.extension, ".md");
        assert_eq!(renamed.category(), FileCategory::Code);

        let err = h.service.rename(record.id, 3, "notes.exe").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rename_rejects_unsafe_names() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let err = h.service.rename(record.id, 3, "../x.txt").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(h.local.exists(&record.storage_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_commit_failure_restores_artifact() {
        let h = harness();
        let record = h
            .service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();
        h.repo.fail_commits(true);

        let err = h.service.rename(record.id, 3, "plan.txt").await.unwrap_err();

        assert!(matches!(err, AppError::Transaction(_)));
        assert!(h.local.exists(&record.storage_key).await.unwrap());
        assert_eq!(artifact_count(h.local.uploads_dir()), 1);
    }

    /// Backend without rename support, like object storage
    struct NoRenameStorage(LocalStorage);

    #[async_trait]
    impl StorageBackend for NoRenameStorage {
        fn kind(&self) -> BackendKind {
            BackendKind::Object
        }

        fn generate_key(&self, owner_id: i64, category: &str, name: &str, ts: i64) -> String {
            self.0.generate_key(owner_id, category, name, ts)
        }

        async fn put(
            &self,
            key: &str,
            reader: ByteStream,
            content_type: &str,
        ) -> std::result::Result<u64, StorageError> {
            self.0.put(key, reader, content_type).await
        }

        async fn get(&self, key: &str) -> std::result::Result<Vec<u8>, StorageError> {
            self.0.get(key).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.0.delete(key).await
        }

        fn resolve_url(&self, _key: &str) -> std::result::Result<String, StorageError> {
            Err(StorageError::Unavailable("no public endpoint".to_string()))
        }

        async fn rename(
            &self,
            key: &str,
            _new_name: &str,
        ) -> std::result::Result<String, StorageError> {
            Err(StorageError::Unsupported(key.to_string()))
        }

        async fn exists(&self, key: &str) -> std::result::Result<bool, StorageError> {
            self.0.exists(key).await
        }
    }

    #[tokio::test]
    async fn test_rename_unsupported_leaves_record_untouched() {
        let dir = TempDir::new().unwrap();
        let repo = MemoryFileRepository::new();
        let service = FileService::new(
            Arc::new(repo.clone()),
            Arc::new(NoRenameStorage(LocalStorage::new(dir.path()).unwrap())),
            settings(100),
        );
        let record = service
            .upload(request(3, "notes.txt", 10, b"0123456789"))
            .await
            .unwrap();

        let err = service.rename(record.id, 3, "plan.txt").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(repo.rows()[0].file_name, "notes.txt");

        let response = service.to_response(&record);
        assert_eq!(response.url, format!("/api/files/download/{}", record.id));
    }
}
