//! Streaming domain.
//!
//! Turns the raw delta stream of one assistant turn into typed outbound
//! events. Prose passes through to the client while the single embedded
//! ```json block is buffered, parsed and emitted as metadata.
//!
//! - `FenceScanner` - splits deltas into prose and block segments
//! - `StructuredPayload` - lenient parser for the block body
//! - `Multiplexer` - segments to `OutboundEvent`s at a chosen granularity
//! - `TurnPipeline` - all of the above for one turn

mod events;
mod fence;
mod multiplexer;
mod payload;
mod pipeline;

pub use events::{OutboundEvent, StreamFrame, DONE_SENTINEL};
pub use fence::{FenceScanner, ScanMode, Segment, CLOSE_FENCE, OPEN_FENCE};
pub use multiplexer::{EmissionGranularity, Multiplexer};
pub use payload::{StructuredPayload, StructuredPayloadParseError};
pub use pipeline::{TurnOutcome, TurnPipeline, TurnSummary};
