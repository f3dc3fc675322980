//! System prompt assembly for the project creation assistant.
//!
//! The prompt has four parts, joined by blank lines:
//!
//! 1. The assistant persona (overridable per deployment)
//! 2. Guidance on what to collect and how to converse (overridable)
//! 3. The fields collected so far, as pretty-printed JSON
//! 4. The response format contract: a single ```json block carrying
//!    `extracted_fields`, `reply` and `is_complete`

use super::fields::{ExtractionState, ProjectField};

/// Default assistant persona.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly assistant that helps teachers create PBL (problem-based learning) projects.";

/// Output contract the streaming extractor relies on.
pub const RESPONSE_FORMAT_INSTRUCTION: &str = r#"IMPORTANT: you must answer in JSON, wrapped in a ```json code block:
```json
{
  "extracted_fields": { "title": "...", "problem_statement": "..." },
  "reply": "your reply to the user",
  "is_complete": false
}
```

Notes:
- extracted_fields only contains fields that are new or changed in this turn
- is_complete is true once enough information has been collected
- reply is your natural-language reply to the user"#;

/// Prompt text used to build the system instruction for each turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_prompt: String,
    guidance: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            guidance: default_guidance(),
        }
    }
}

impl PromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the assistant persona.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Replaces the collection guidance.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    /// Renders the full system instruction for the current state.
    pub fn render(&self, state: &ExtractionState) -> String {
        format!(
            "{}\n\n{}\n\nFields collected so far:\n{}\n\n{}",
            self.system_prompt,
            self.guidance,
            state.to_pretty_json(),
            RESPONSE_FORMAT_INSTRUCTION
        )
    }
}

fn default_guidance() -> String {
    let fields = ProjectField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            format!(
                "{}. {} ({}) - {}",
                i + 1,
                field.as_str(),
                field.label(),
                if field.is_required() { "required" } else { "optional" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Your task is to guide the user through creating a PBL project in conversation.\n\n\
         Information to collect:\n{fields}\n\n\
         Conversation guidelines:\n\
         - Be friendly and encouraging\n\
         - Ask one question at a time\n\
         - Lead naturally from the user's answer to the next question\n\
         - Once title and problem_statement are collected, ask whether the user wants to add more detail\n\
         - When the user says they are done, summarise the information and confirm"
    )
}
