mod dto;
mod handler;
mod model;
mod routes;
mod service;

pub use dto::ThemePayload;
pub use handler::*;
pub use model::Theme;
pub use routes::routes;
pub use service::ThemeService;
