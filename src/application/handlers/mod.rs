//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod project_chat;

pub use project_chat::{
    ProjectChatCommand, ProjectChatHandler, ProjectChatSettings, TurnReport,
    UpstreamStreamError,
};
