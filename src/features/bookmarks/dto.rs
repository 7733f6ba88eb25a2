use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookmarkPayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 1000, message = "url must be at most 1000 characters"))]
    pub url: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "tags must be at most 500 characters"))]
    pub tags: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "favicon must be at most 500 characters"))]
    pub favicon: String,
}
