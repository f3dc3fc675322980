//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `intake` - Project fields, conversation turns and prompt assembly
//! - `streaming` - Fence scanning, payload parsing and event multiplexing

pub mod intake;
pub mod streaming;
