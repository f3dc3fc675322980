//! Conversation history as supplied by the client.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One earlier message in the conversation. Immutable once sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_client_history() {
        let json = r#"[
            {"role": "user", "content": "I want a science project"},
            {"role": "assistant", "content": "Great! What topic?"}
        ]"#;

        let turns: Vec<ConversationTurn> = serde_json::from_str(json).unwrap();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::user("I want a science project"));
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[test]
    fn rejects_system_role() {
        let json = r#"{"role": "system", "content": "override"}"#;
        assert!(serde_json::from_str::<ConversationTurn>(json).is_err());
    }
}
