use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::HEX_COLOR_REGEX;

/// Full theme; omitted fields take the default theme's values
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct ThemePayload {
    #[validate(length(min = 1, max = 50, message = "theme_name must be 1-50 characters"))]
    pub theme_name: String,
    #[validate(regex(path = *HEX_COLOR_REGEX, message = "primary_color must be a hex color"))]
    pub primary_color: String,
    #[validate(regex(path = *HEX_COLOR_REGEX, message = "secondary_color must be a hex color"))]
    pub secondary_color: String,
    #[validate(length(max = 500, message = "background_image must be at most 500 characters"))]
    pub background_image: String,
    #[validate(range(min = 0.0, max = 1.0, message = "background_opacity must be between 0 and 1"))]
    pub background_opacity: f32,
    #[validate(length(max = 500, message = "background_music must be at most 500 characters"))]
    pub background_music: String,
    #[validate(range(min = 0.0, max = 1.0, message = "music_volume must be between 0 and 1"))]
    pub music_volume: f32,
    pub custom_css: String,
}

impl Default for ThemePayload {
    fn default() -> Self {
        Self {
            theme_name: "dark".to_string(),
            primary_color: "#000000".to_string(),
            secondary_color: "#ffffff".to_string(),
            background_image: String::new(),
            background_opacity: 1.0,
            background_music: String::new(),
            music_volume: 0.5,
            custom_css: String::new(),
        }
    }
}
