use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::features::files::models::{FileCategory, FileRecord, NewFileRecord};

const FILE_COLUMNS: &str = "id, user_id, file_name, storage_key, file_size, mime_type, \
     extension, category, thumbnail_key, created_at, updated_at, deleted_at";

/// Read access to file metadata plus the entry point for transactional writes.
///
/// Every lookup applies the visibility rule: a caller sees its own rows and
/// rows owned by the shared owner `0`. Soft-deleted rows are never returned.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn list_visible(
        &self,
        owner_id: i64,
        category: Option<FileCategory>,
    ) -> Result<Vec<FileRecord>, sqlx::Error>;

    async fn find_visible(&self, id: i64, owner_id: i64)
        -> Result<Option<FileRecord>, sqlx::Error>;

    async fn begin(&self) -> Result<Box<dyn FileTransaction>, sqlx::Error>;
}

/// Writes performed inside one database transaction.
///
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait FileTransaction: Send {
    async fn insert(&mut self, record: &NewFileRecord) -> Result<FileRecord, sqlx::Error>;

    /// Visible lookup that also locks the row until the transaction ends
    async fn find_visible_for_update(
        &mut self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error>;

    /// Marks the row deleted; returns the number of rows affected
    async fn soft_delete(&mut self, id: i64) -> Result<u64, sqlx::Error>;

    async fn update_name(
        &mut self,
        id: i64,
        file_name: &str,
        storage_key: &str,
        extension: &str,
        category: FileCategory,
    ) -> Result<FileRecord, sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error>;
}

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn list_visible(
        &self,
        owner_id: i64,
        category: Option<FileCategory>,
    ) -> Result<Vec<FileRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE (user_id = $1 OR user_id = 0) AND deleted_at IS NULL \
             AND ($2::VARCHAR IS NULL OR category = $2) \
             ORDER BY created_at DESC, id DESC"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .bind(category.map(|c| c.as_str()))
            .fetch_all(&self.pool)
            .await
    }

    async fn find_visible(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE id = $1 AND (user_id = $2 OR user_id = 0) AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn begin(&self) -> Result<Box<dyn FileTransaction>, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgFileTransaction { tx }))
    }
}

struct PgFileTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl FileTransaction for PgFileTransaction {
    async fn insert(&mut self, record: &NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        let sql = format!(
            "INSERT INTO files \
             (user_id, file_name, storage_key, file_size, mime_type, extension, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {FILE_COLUMNS}"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(record.user_id)
            .bind(&record.file_name)
            .bind(&record.storage_key)
            .bind(record.file_size)
            .bind(&record.mime_type)
            .bind(&record.extension)
            .bind(record.category.as_str())
            .fetch_one(&mut *self.tx)
            .await
    }

    async fn find_visible_for_update(
        &mut self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE id = $1 AND (user_id = $2 OR user_id = 0) AND deleted_at IS NULL \
             FOR UPDATE"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *self.tx)
            .await
    }

    async fn soft_delete(&mut self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE files SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_name(
        &mut self,
        id: i64,
        file_name: &str,
        storage_key: &str,
        extension: &str,
        category: FileCategory,
    ) -> Result<FileRecord, sqlx::Error> {
        let sql = format!(
            "UPDATE files \
             SET file_name = $2, storage_key = $3, extension = $4, category = $5, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {FILE_COLUMNS}"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(file_name)
            .bind(storage_key)
            .bind(extension)
            .bind(category.as_str())
            .fetch_one(&mut *self.tx)
            .await
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}
