//! HTTP handlers for the project chat endpoint.
//!
//! The turn itself runs in a spawned task; the response body drains its
//! frame channel. Dropping the body (client disconnect) cancels the turn.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream;
use tokio_util::sync::CancellationToken;

use super::dto::{ErrorResponse, ProjectChatRequest};
use crate::application::handlers::project_chat::ProjectChatHandler;

/// Shared application state for project chat handlers.
#[derive(Clone)]
pub struct ProjectChatAppState {
    pub handler: Arc<ProjectChatHandler>,
    pub max_message_chars: usize,
}

impl ProjectChatAppState {
    pub fn new(handler: Arc<ProjectChatHandler>, max_message_chars: usize) -> Self {
        Self {
            handler,
            max_message_chars,
        }
    }
}

/// POST /api/chat/project-creation - Stream one project creation turn.
///
/// Responds with `text/event-stream`: one `data:` frame per event, ending
/// with `data: [DONE]` or, on upstream failure, an error event.
///
/// # Errors
/// - 400 Bad Request: Malformed body, blank or oversized message
pub async fn create_project_chat(
    State(state): State<ProjectChatAppState>,
    payload: Result<Json<ProjectChatRequest>, JsonRejection>,
) -> Result<Response, ProjectChatApiError> {
    let Json(request) = payload?;
    request
        .validate(state.max_message_chars)
        .map_err(ProjectChatApiError::BadRequest)?;

    let cancel = CancellationToken::new();
    let frames = state.handler.start(request.into_command(), cancel.clone());
    let guard = cancel.drop_guard();

    // The body ends right after a terminal frame; dropping it early cancels the turn.
    let events = stream::unfold(
        (frames, guard, false),
        |(mut frames, guard, ended)| async move {
            if ended {
                return None;
            }
            let frame = frames.recv().await?;
            let ended = frame.is_terminal();
            let event = Event::default().data(frame.data());
            Some((Ok::<_, Infallible>(event), (frames, guard, ended)))
        },
    );

    Ok(Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// API error type for project chat endpoints.
#[derive(Debug)]
pub enum ProjectChatApiError {
    BadRequest(String),
    Internal(String),
}

impl From<JsonRejection> for ProjectChatApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status().is_server_error() {
            ProjectChatApiError::Internal(rejection.body_text())
        } else {
            ProjectChatApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ProjectChatApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ProjectChatApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            ProjectChatApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("An internal error occurred"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
