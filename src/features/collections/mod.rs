mod dto;
mod model;

pub use dto::CollectionPayload;
pub use model::{Collection, Collections};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes(
        "/api/collections",
        Arc::new(CrudRepository::<Collections>::new(pool)),
    )
}
