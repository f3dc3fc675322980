//! HTTP adapters - REST API implementations.
//!
//! `app_router` assembles the full application with tracing and CORS layers.

pub mod project_chat;

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use project_chat::{project_chat_router, ProjectChatAppState};

/// Builds the application router.
///
/// An empty origin list allows any origin. Origins that are not valid
/// header values are skipped with a warning.
pub fn app_router(state: ProjectChatAppState, cors_origins: &[String]) -> Router {
    project_chat_router()
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}
