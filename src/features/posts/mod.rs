mod dto;
mod model;

pub use dto::PostPayload;
pub use model::{Post, Posts};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes("/api/posts", Arc::new(CrudRepository::<Posts>::new(pool)))
}
