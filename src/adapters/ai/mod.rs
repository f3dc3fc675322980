//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scripted streams for testing
//! - `OpenAIProvider` - OpenAI-compatible chat completions (OpenAI, OpenRouter)

mod mock_provider;
mod openai_provider;
mod sse;

pub use mock_provider::{MockAIProvider, MockEnding, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use sse::SseDecoder;
