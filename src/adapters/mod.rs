//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Streaming LLM providers (OpenAI-compatible, mock)
//! - `http` - The SSE chat endpoint

pub mod ai;
pub mod http;

pub use ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use self::http::{app_router, ProjectChatAppState};
