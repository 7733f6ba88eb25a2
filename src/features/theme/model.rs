use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Per-user appearance settings; exactly one row per user
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Theme {
    pub id: i64,
    pub user_id: i64,
    pub theme_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub background_image: String,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub background_opacity: f32,
    pub background_music: String,
    pub music_volume: f32,
    pub custom_css: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
