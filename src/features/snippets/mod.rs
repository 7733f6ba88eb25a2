mod dto;
mod model;

pub use dto::SnippetPayload;
pub use model::{CodeSnippet, Snippets};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes(
        "/api/snippets",
        Arc::new(CrudRepository::<Snippets>::new(pool)),
    )
}
