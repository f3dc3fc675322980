//! Axum routes for the project chat endpoint.

use axum::routing::post;
use axum::Router;

use super::handlers::{create_project_chat, ProjectChatAppState};

/// Creates routes for project chat.
///
/// Endpoints:
/// - POST /chat/project-creation - Stream a project creation turn (SSE)
pub fn project_chat_routes() -> Router<ProjectChatAppState> {
    Router::new().route("/chat/project-creation", post(create_project_chat))
}

/// Project chat routes under /api.
pub fn project_chat_router() -> Router<ProjectChatAppState> {
    Router::new().nest("/api", project_chat_routes())
}
