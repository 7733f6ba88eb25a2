use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostPayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Derived from the content when empty
    #[serde(default)]
    #[validate(length(max = 500, message = "excerpt must be at most 500 characters"))]
    pub excerpt: String,
    /// Placeholder image when empty
    #[serde(default)]
    #[validate(length(max = 1000, message = "cover must be at most 1000 characters"))]
    pub cover: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "tags must be at most 500 characters"))]
    pub tags: String,
}
