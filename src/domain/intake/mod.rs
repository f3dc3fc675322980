//! Project intake domain.
//!
//! Types describing what the project creation assistant collects and how
//! it is instructed:
//!
//! - `ConversationTurn` - prior messages supplied by the client
//! - `ProjectField` / `ExtractionState` - the fields gathered so far
//! - `PromptTemplate` - system instruction assembly

mod fields;
mod prompt;
mod turn;

pub use fields::{ExtractionState, ProjectField, UnknownFieldError};
pub use prompt::{PromptTemplate, DEFAULT_SYSTEM_PROMPT, RESPONSE_FORMAT_INSTRUCTION};
pub use turn::{ConversationTurn, TurnRole};
