use sqlx::PgPool;

use super::dto::ThemePayload;
use super::model::Theme;
use crate::core::error::Result;

const THEME_COLUMNS: &str = "id, user_id, theme_name, primary_color, secondary_color, \
     background_image, background_opacity, background_music, music_volume, custom_css, \
     created_at, updated_at";

pub struct ThemeService {
    pool: PgPool,
}

impl ThemeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The caller's theme, creating the default row on first access
    pub async fn get_or_default(&self, user_id: i64) -> Result<Theme> {
        let created = sqlx::query(
            "INSERT INTO themes (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if created.rows_affected() > 0 {
            tracing::info!("Created default theme for user {}", user_id);
        }

        let sql = format!("SELECT {THEME_COLUMNS} FROM themes WHERE user_id = $1");
        let theme = sqlx::query_as::<_, Theme>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(theme)
    }

    pub async fn upsert(&self, user_id: i64, payload: ThemePayload) -> Result<Theme> {
        let sql = format!(
            "INSERT INTO themes (user_id, theme_name, primary_color, secondary_color, \
             background_image, background_opacity, background_music, music_volume, custom_css) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id) DO UPDATE SET \
             theme_name = EXCLUDED.theme_name, \
             primary_color = EXCLUDED.primary_color, \
             secondary_color = EXCLUDED.secondary_color, \
             background_image = EXCLUDED.background_image, \
             background_opacity = EXCLUDED.background_opacity, \
             background_music = EXCLUDED.background_music, \
             music_volume = EXCLUDED.music_volume, \
             custom_css = EXCLUDED.custom_css, \
             updated_at = NOW() \
             RETURNING {THEME_COLUMNS}"
        );

        let theme = sqlx::query_as::<_, Theme>(&sql)
            .bind(user_id)
            .bind(payload.theme_name)
            .bind(payload.primary_color)
            .bind(payload.secondary_color)
            .bind(payload.background_image)
            .bind(payload.background_opacity)
            .bind(payload.background_music)
            .bind(payload.music_volume)
            .bind(payload.custom_css)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Theme saved for user {}", user_id);
        Ok(theme)
    }
}
