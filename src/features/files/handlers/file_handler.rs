use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::CurrentUser;
use crate::features::files::dtos::{FileResponseDto, RenameFileDto, UploadFileDto};
use crate::features::files::models::FileCategory;
use crate::features::files::services::{FileService, UploadRequest};
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FileValidationError;

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `size`: Declared size in bytes (optional, defaults to the received length)
///
/// The file part is buffered in memory (bounded by the route's body limit)
/// before the upload deadline starts; the deadline covers the backend write.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid file or validation error"),
        (status = 500, description = "Storage or database failure")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>)> {
    let too_large = |e: MultipartError| -> AppError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FileValidationError::TooLarge {
                max: service.max_upload_size(),
            }
            .into()
        } else {
            debug!("Failed to read multipart data: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        }
    };

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut declared_size: Option<u64> = None;

    while let Some(field) = multipart.next_field().await.map_err(too_large)? {
        match field.name().unwrap_or("") {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(too_large)?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            "size" => {
                let text = field.text().await.map_err(too_large)?;
                let size = text.trim().parse::<u64>().map_err(|_| {
                    AppError::Validation("size must be a non-negative integer".to_string())
                })?;
                declared_size = Some(size);
            }
            other => debug!("Ignoring unknown field: {}", other),
        }
    }

    let (file_name, content_type, data) = file.ok_or(FileValidationError::Missing)?;
    let declared_size = declared_size.unwrap_or(data.len() as u64);

    let record = service
        .upload(UploadRequest {
            owner_id: user.id,
            file_name,
            declared_size,
            content_type,
            reader: Box::new(Cursor::new(data)),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(service.to_response(&record)),
            Some("File uploaded successfully".to_string()),
            None,
        )),
    ))
}

/// List files visible to the caller
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Visible files, newest first", body = ApiResponse<Vec<FileResponseDto>>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let records = service.list(user.id).await?;
    let files: Vec<FileResponseDto> = records.iter().map(|r| service.to_response(r)).collect();
    let meta = Meta::with_total(files.len());
    Ok(Json(ApiResponse::success(Some(files), None, Some(meta))))
}

/// Get file metadata by ID
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File found", body = ApiResponse<FileResponseDto>),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_file(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    let record = service.get(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        Some(service.to_response(&record)),
        None,
        None,
    )))
}

/// List visible files in one category
#[utoipa::path(
    get,
    path = "/api/files/category/{category}",
    tag = "files",
    params(("category" = FileCategory, Path, description = "media, document, code, archive or other")),
    responses(
        (status = 200, description = "Files in the category", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 400, description = "Unknown category")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files_by_category(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>> {
    let category: FileCategory = category
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown file category '{}'", category)))?;

    let records = service.list_by_category(category, user.id).await?;
    let files: Vec<FileResponseDto> = records.iter().map(|r| service.to_response(r)).collect();
    let meta = Meta::with_total(files.len());
    Ok(Json(ApiResponse::success(Some(files), None, Some(meta))))
}

/// Download file content
#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File or content not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_file(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let (record, bytes) = service.download(id, user.id).await?;

    let content_type = HeaderValue::from_str(&record.mime_type)
        .map_err(|e| AppError::Internal(format!("stored content type of file {}: {}", id, e)))?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&record.file_name)
    ))
    .map_err(|e| AppError::Internal(format!("content disposition of file {}: {}", id, e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Rename a file
#[utoipa::path(
    put,
    path = "/api/files/{id}/rename",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    request_body = RenameFileDto,
    responses(
        (status = 200, description = "File renamed", body = ApiResponse<FileResponseDto>),
        (status = 400, description = "Invalid name or rename unsupported"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Target name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_file(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<RenameFileDto>,
) -> Result<Json<ApiResponse<FileResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service.rename(id, user.id, &dto.new_name).await?;
    Ok(Json(ApiResponse::success(
        Some(service.to_response(&record)),
        Some("File renamed successfully".to_string()),
        None,
    )))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted successfully"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    user: CurrentUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("File deleted successfully".to_string()),
        None,
    )))
}
