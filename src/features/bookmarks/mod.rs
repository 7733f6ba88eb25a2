mod dto;
mod model;

pub use dto::BookmarkPayload;
pub use model::{Bookmark, Bookmarks};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes(
        "/api/bookmarks",
        Arc::new(CrudRepository::<Bookmarks>::new(pool)),
    )
}
