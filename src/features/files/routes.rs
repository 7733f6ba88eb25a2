use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, get_file, list_files, list_files_by_category, rename_file,
    upload_file,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MULTIPART_OVERHEAD_BYTES;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    // Allow body size up to the upload limit plus multipart framing
    let body_limit =
        (file_service.max_upload_size() as usize).saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/api/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files", get(list_files))
        .route("/api/files/category/{category}", get(list_files_by_category))
        .route("/api/files/download/{id}", get(download_file))
        .route("/api/files/{id}", get(get_file).delete(delete_file))
        .route("/api/files/{id}/rename", put(rename_file))
        .with_state(file_service)
}
