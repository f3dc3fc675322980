//! HTTP adapter for the project chat endpoint.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, ProjectChatRequest};
pub use handlers::{create_project_chat, ProjectChatApiError, ProjectChatAppState};
pub use routes::{project_chat_router, project_chat_routes};
