use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::dto::PostPayload;
use crate::shared::crud::{FieldBinder, NoFilter, Resource};

const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub cover: String,
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// First 100 characters of `content`, with "..." when truncated
fn derive_excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn placeholder_cover(seed: i64) -> String {
    format!("https://picsum.photos/seed/{}/300/200", seed)
}

pub struct Posts;

impl Resource for Posts {
    type Entity = Post;
    type Payload = PostPayload;
    type Filter = NoFilter;

    const TABLE: &'static str = "posts";
    const NAME: &'static str = "Post";
    const COLUMNS: &'static [&'static str] = &["title", "content", "excerpt", "cover", "tags"];

    fn bind_payload(payload: PostPayload, binder: &mut FieldBinder<'_>) {
        let excerpt = if payload.excerpt.is_empty() {
            derive_excerpt(&payload.content)
        } else {
            payload.excerpt
        };
        let cover = if payload.cover.is_empty() {
            placeholder_cover(Utc::now().timestamp())
        } else {
            payload.cover
        };

        binder
            .bind(payload.title)
            .bind(payload.content)
            .bind(excerpt)
            .bind(cover)
            .bind(payload.tags);
    }
}
