//! Structured payload parsing.
//!
//! The body of the ```json block must be a JSON object. Each of its three
//! keys is optional and read independently, so a missing or mistyped key
//! never invalidates the others.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::intake::ExtractionState;

/// Errors that can occur while parsing a structured block.
#[derive(Debug, Error)]
pub enum StructuredPayloadParseError {
    #[error("invalid JSON in structured block: {0}")]
    Json(#[from] serde_json::Error),

    #[error("structured block is not a JSON object")]
    NotAnObject,
}

/// The assistant's structured answer for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredPayload {
    /// Fields set or changed in this turn.
    pub extracted_fields: Option<ExtractionState>,
    /// Finished reply text for the user.
    pub reply: Option<String>,
    /// `None` when the key is absent, which is distinct from `false`.
    pub is_complete: Option<bool>,
}

impl StructuredPayload {
    /// Parses the raw text buffered between fences.
    pub fn parse(raw: &str) -> Result<Self, StructuredPayloadParseError> {
        let value: Value = serde_json::from_str(raw.trim())?;
        let Value::Object(object) = value else {
            return Err(StructuredPayloadParseError::NotAnObject);
        };
        Ok(Self::from_object(&object))
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let extracted_fields = match object.get("extracted_fields") {
            Some(Value::Object(fields)) => Some(ExtractionState::from_json_map(fields)),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::debug!(value = %other, "Ignoring non-object extracted_fields");
                None
            }
        };

        let reply = match object.get("reply") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::debug!(value = %other, "Ignoring non-string reply");
                None
            }
        };

        let is_complete = match object.get("is_complete") {
            Some(Value::Bool(flag)) => Some(*flag),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::debug!(value = %other, "Ignoring non-boolean is_complete");
                None
            }
        };

        Self {
            extracted_fields,
            reply,
            is_complete,
        }
    }

    /// Returns true if the payload carries nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.extracted_fields.as_ref().map_or(true, ExtractionState::is_empty)
            && self.reply.as_deref().map_or(true, str::is_empty)
            && self.is_complete.is_none()
    }
}
