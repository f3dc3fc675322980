//! Data Transfer Objects for the project chat endpoint.

use serde::{Deserialize, Serialize};

use crate::application::handlers::project_chat::ProjectChatCommand;
use crate::domain::intake::{ConversationTurn, ExtractionState};

/// Request body for `POST /api/chat/project-creation`.
///
/// The client owns the conversation: it sends the full history and the
/// fields collected so far on every turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chat_history: Option<Vec<ConversationTurn>>,
    #[serde(default)]
    pub extracted_fields: Option<ExtractionState>,
}

impl ProjectChatRequest {
    /// Checks the request before any upstream call is made.
    pub fn validate(&self, max_message_chars: usize) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("Message is required".to_string());
        }
        let length = self.message.chars().count();
        if length > max_message_chars {
            return Err(format!(
                "Message is too long: {} characters (maximum {})",
                length, max_message_chars
            ));
        }
        Ok(())
    }

    pub fn into_command(self) -> ProjectChatCommand {
        ProjectChatCommand::new(self.message)
            .with_history(self.chat_history.unwrap_or_default())
            .with_fields(self.extracted_fields.unwrap_or_default())
    }
}

/// Error body returned before streaming starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
