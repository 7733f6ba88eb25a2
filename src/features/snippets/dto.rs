use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SnippetPayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "language must be 1-50 characters"))]
    pub language: String,
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "tags must be at most 500 characters"))]
    pub tags: String,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnippetFilter {
    pub language: Option<String>,
}
