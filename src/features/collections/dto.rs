use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CollectionPayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "url must be at most 1000 characters"))]
    pub url: String,
    /// Free-form kind such as "video", "article" or "music"
    #[serde(default, rename = "type")]
    #[validate(length(max = 50, message = "type must be at most 50 characters"))]
    pub collection_type: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "thumbnail must be at most 1000 characters"))]
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "tags must be at most 500 characters"))]
    pub tags: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CollectionFilter {
    #[serde(rename = "type")]
    pub collection_type: Option<String>,
}
