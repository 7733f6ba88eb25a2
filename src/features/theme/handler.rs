use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use super::dto::ThemePayload;
use super::model::Theme;
use super::service::ThemeService;
use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::CurrentUser;
use crate::shared::types::ApiResponse;

/// Get the caller's theme, creating the default one if needed
#[utoipa::path(
    get,
    path = "/api/theme",
    tag = "theme",
    responses(
        (status = 200, description = "Current theme", body = ApiResponse<Theme>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_theme(
    user: CurrentUser,
    State(service): State<Arc<ThemeService>>,
) -> Result<Json<ApiResponse<Theme>>> {
    let theme = service.get_or_default(user.id).await?;
    Ok(Json(ApiResponse::success(Some(theme), None, None)))
}

/// Create or replace the caller's theme
#[utoipa::path(
    put,
    path = "/api/theme",
    tag = "theme",
    request_body = ThemePayload,
    responses(
        (status = 200, description = "Theme saved", body = ApiResponse<Theme>),
        (status = 400, description = "Invalid theme values")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_theme(
    user: CurrentUser,
    State(service): State<Arc<ThemeService>>,
    AppJson(payload): AppJson<ThemePayload>,
) -> Result<Json<ApiResponse<Theme>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let theme = service.upsert(user.id, payload).await?;
    Ok(Json(ApiResponse::success(
        Some(theme),
        Some("Theme updated successfully".to_string()),
        None,
    )))
}
