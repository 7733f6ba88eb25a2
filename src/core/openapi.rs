use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::{bookmarks, chat, collections, events, notes, posts, snippets, tasks, theme};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::list_files_by_category,
        files_handlers::download_file,
        files_handlers::rename_file,
        files_handlers::delete_file,
        // Chat
        chat::get_history,
        chat::send_message,
        chat::clear_history,
        // Theme
        theme::get_theme,
        theme::update_theme,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Files
            files_models::FileCategory,
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::RenameFileDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            // Resources
            notes::Note,
            notes::NotePayload,
            tasks::Task,
            tasks::TaskPayload,
            tasks::TaskStatus,
            tasks::TaskPriority,
            bookmarks::Bookmark,
            bookmarks::BookmarkPayload,
            events::Event,
            events::EventPayload,
            collections::Collection,
            collections::CollectionPayload,
            snippets::CodeSnippet,
            snippets::SnippetPayload,
            posts::Post,
            posts::PostPayload,
            // Chat
            chat::ChatRole,
            chat::ChatMessage,
            chat::SendMessageDto,
            chat::ChatExchangeDto,
            ApiResponse<Vec<chat::ChatMessage>>,
            ApiResponse<chat::ChatExchangeDto>,
            // Theme
            theme::Theme,
            theme::ThemePayload,
            ApiResponse<theme::Theme>,
        )
    ),
    tags(
        (name = "files", description = "File upload, download and management"),
        (name = "chat", description = "Chat history with the assistant"),
        (name = "theme", description = "Per-user appearance settings"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "NexusHub API",
        version = "0.1.0",
        description = "API documentation for NexusHub",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
