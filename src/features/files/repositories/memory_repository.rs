//! In-memory `FileRepository` used by service and handler tests.
//!
//! Writes are staged per transaction and applied on commit. A single lock
//! stands in for row locks: `find_visible_for_update` holds it until the
//! transaction ends.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

use super::{FileRepository, FileTransaction};
use crate::features::files::models::{FileCategory, FileRecord, NewFileRecord};

#[derive(Default)]
struct Shared {
    rows: Mutex<Vec<FileRecord>>,
    next_id: AtomicI64,
    row_lock: Arc<tokio::sync::Mutex<()>>,
    fail_commit: AtomicBool,
    fail_insert: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryFileRepository {
    shared: Arc<Shared>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, fail: bool) {
        self.shared.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.shared.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// All rows, including soft-deleted ones
    pub fn rows(&self) -> Vec<FileRecord> {
        self.shared.rows.lock().unwrap().clone()
    }

    /// Inserts a committed row directly, bypassing the orchestrator
    pub fn seed(&self, user_id: i64, file_name: &str, storage_key: &str) -> FileRecord {
        self.seed_with_thumbnail(user_id, file_name, storage_key, None)
    }

    pub fn seed_with_thumbnail(
        &self,
        user_id: i64,
        file_name: &str,
        storage_key: &str,
        thumbnail_key: Option<&str>,
    ) -> FileRecord {
        let extension = crate::shared::validation::file_extension(file_name);
        let record = build_record(
            self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            &NewFileRecord {
                user_id,
                file_name: file_name.to_string(),
                storage_key: storage_key.to_string(),
                file_size: 1,
                mime_type: "application/octet-stream".to_string(),
                category: FileCategory::from_extension(&extension),
                extension,
            },
        );
        let record = FileRecord {
            thumbnail_key: thumbnail_key.map(str::to_string),
            ..record
        };
        self.shared.rows.lock().unwrap().push(record.clone());
        record
    }
}

fn visible_to(owner_id: i64) -> impl Fn(&&FileRecord) -> bool {
    move |r: &&FileRecord| (r.user_id == owner_id || r.user_id == 0) && r.deleted_at.is_none()
}

fn build_record(id: i64, new: &NewFileRecord) -> FileRecord {
    let now = Utc::now();
    FileRecord {
        id,
        user_id: new.user_id,
        file_name: new.file_name.clone(),
        storage_key: new.storage_key.clone(),
        file_size: new.file_size,
        mime_type: new.mime_type.clone(),
        extension: new.extension.clone(),
        category: new.category.as_str().to_string(),
        thumbnail_key: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn simulated_failure(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("simulated {} failure", what))
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn list_visible(
        &self,
        owner_id: i64,
        category: Option<FileCategory>,
    ) -> Result<Vec<FileRecord>, sqlx::Error> {
        let rows = self.shared.rows.lock().unwrap();
        let mut visible: Vec<FileRecord> = rows
            .iter()
            .filter(visible_to(owner_id))
            .filter(|r| category.map_or(true, |c| r.category == c.as_str()))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(visible)
    }

    async fn find_visible(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        let rows = self.shared.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(visible_to(owner_id))
            .find(|r| r.id == id)
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn FileTransaction>, sqlx::Error> {
        Ok(Box::new(MemoryFileTransaction {
            repo: self.clone(),
            staged: Vec::new(),
            lock: None,
        }))
    }
}

enum Staged {
    Insert(FileRecord),
    SoftDelete(i64),
    Rename(FileRecord),
}

struct MemoryFileTransaction {
    repo: MemoryFileRepository,
    staged: Vec<Staged>,
    lock: Option<OwnedMutexGuard<()>>,
}

#[async_trait]
impl FileTransaction for MemoryFileTransaction {
    async fn insert(&mut self, record: &NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        if self.repo.shared.fail_insert.load(Ordering::SeqCst) {
            return Err(simulated_failure("insert"));
        }
        let id = self.repo.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = build_record(id, record);
        self.staged.push(Staged::Insert(row.clone()));
        Ok(row)
    }

    async fn find_visible_for_update(
        &mut self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        if self.lock.is_none() {
            self.lock = Some(self.repo.shared.row_lock.clone().lock_owned().await);
        }
        self.repo.find_visible(id, owner_id).await
    }

    async fn soft_delete(&mut self, id: i64) -> Result<u64, sqlx::Error> {
        let active = self
            .repo
            .shared
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.id == id && r.deleted_at.is_none());
        let already_staged = self
            .staged
            .iter()
            .any(|s| matches!(s, Staged::SoftDelete(staged) if *staged == id));

        if active && !already_staged {
            self.staged.push(Staged::SoftDelete(id));
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn update_name(
        &mut self,
        id: i64,
        file_name: &str,
        storage_key: &str,
        extension: &str,
        category: FileCategory,
    ) -> Result<FileRecord, sqlx::Error> {
        let mut row = self
            .repo
            .shared
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;

        row.file_name = file_name.to_string();
        row.storage_key = storage_key.to_string();
        row.extension = extension.to_string();
        row.category = category.as_str().to_string();
        row.updated_at = Utc::now();
        self.staged.push(Staged::Rename(row.clone()));
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let MemoryFileTransaction {
            repo,
            staged,
            lock: _lock,
        } = *self;

        if repo.shared.fail_commit.load(Ordering::SeqCst) {
            return Err(simulated_failure("commit"));
        }

        let mut rows = repo.shared.rows.lock().unwrap();
        for op in staged {
            match op {
                Staged::Insert(row) => rows.push(row),
                Staged::SoftDelete(id) => {
                    if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
                        row.deleted_at = Some(Utc::now());
                    }
                }
                Staged::Rename(updated) => {
                    if let Some(row) = rows.iter_mut().find(|r| r.id == updated.id) {
                        *row = updated;
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
