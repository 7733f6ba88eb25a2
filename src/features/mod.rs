pub mod auth;
pub mod bookmarks;
pub mod chat;
pub mod collections;
pub mod events;
pub mod files;
pub mod notes;
pub mod posts;
pub mod snippets;
pub mod tasks;
pub mod theme;
