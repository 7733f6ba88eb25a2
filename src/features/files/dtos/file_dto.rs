use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::files::models::FileCategory;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Declared size in bytes; defaults to the received length
    #[schema(example = 10)]
    pub size: Option<u64>,
}

/// Response DTO for file operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: i64,
    /// Sanitized name as uploaded
    pub file_name: String,
    pub file_size: i64,
    /// MIME type reported at upload
    pub file_type: String,
    /// Lower-cased, dot included
    #[schema(example = ".txt")]
    pub extension: String,
    pub category: FileCategory,
    /// Public URL when the backend has one, otherwise the download endpoint
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameFileDto {
    #[validate(length(min = 1, max = 255, message = "new_name must be 1-255 characters"))]
    pub new_name: String,
}
