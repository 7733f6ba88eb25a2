mod dto;
mod handler;
mod model;
mod routes;
mod service;

pub use dto::{ChatExchangeDto, SendMessageDto};
pub use handler::*;
pub use model::{ChatMessage, ChatRole};
pub use routes::routes;
pub use service::ChatService;
