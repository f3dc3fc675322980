//! Project chat turn handling.

mod decoder;
mod handler;

pub use decoder::{decode_deltas, DeltaStream, UpstreamStreamError};
pub use handler::{
    ProjectChatCommand, ProjectChatHandler, ProjectChatSettings, TurnReport,
    FRAME_CHANNEL_CAPACITY,
};
