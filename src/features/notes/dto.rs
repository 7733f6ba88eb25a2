use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NotePayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Comma-separated
    #[serde(default)]
    #[validate(length(max = 500, message = "tags must be at most 500 characters"))]
    pub tags: String,
    #[serde(default)]
    pub is_pinned: bool,
}
