use axum::{routing::get, Router};
use std::sync::Arc;

use super::handler::{get_theme, update_theme};
use super::service::ThemeService;

pub fn routes(theme_service: Arc<ThemeService>) -> Router {
    Router::new()
        .route("/api/theme", get(get_theme).put(update_theme))
        .with_state(theme_service)
}
