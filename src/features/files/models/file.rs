use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::FileCategory;

/// Database model for files
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: i64,
    /// Owning user; 0 marks a record shared with every caller
    pub user_id: i64,
    pub file_name: String,
    /// Opaque locator understood only by the active storage backend
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub extension: String,
    pub category: String,
    pub thumbnail_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn category(&self) -> FileCategory {
        self.category
            .parse()
            .unwrap_or_else(|_| FileCategory::from_extension(&self.extension))
    }
}

/// Values for a row about to be inserted
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub user_id: i64,
    pub file_name: String,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub extension: String,
    pub category: FileCategory,
}
