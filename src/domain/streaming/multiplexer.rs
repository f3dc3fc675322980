//! Output multiplexer.
//!
//! Turns prose and parsed payloads into outbound events. Prose is split
//! according to the configured [`EmissionGranularity`]; character
//! granularity splits on extended grapheme clusters so multi-byte scripts
//! and combining sequences stay intact.
//!
//! Segmentation only sees one prose unit at a time. A cluster whose parts
//! arrive in different deltas (an emoji and its skin-tone modifier, say)
//! becomes two `content` events; concatenated, they still render as one.

use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use super::events::{OutboundEvent, StreamFrame};
use super::payload::StructuredPayload;

/// How prose is cut into `content` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionGranularity {
    /// One event per grapheme cluster (typewriter effect).
    #[default]
    Character,
    /// One event per word boundary segment, whitespace included.
    Word,
    /// One event per prose unit, unsplit.
    Chunk,
}

/// Event factory for one turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multiplexer {
    granularity: EmissionGranularity,
}

impl Multiplexer {
    pub fn new(granularity: EmissionGranularity) -> Self {
        Self { granularity }
    }

    /// Appends `content` events for a unit of prose.
    pub fn prose(&self, text: &str, out: &mut Vec<StreamFrame>) {
        if text.is_empty() {
            return;
        }
        match self.granularity {
            EmissionGranularity::Character => out.extend(
                text.graphemes(true)
                    .map(|g| StreamFrame::from(OutboundEvent::content(g))),
            ),
            EmissionGranularity::Word => out.extend(
                text.split_word_bounds()
                    .map(|w| StreamFrame::from(OutboundEvent::content(w))),
            ),
            EmissionGranularity::Chunk => out.push(OutboundEvent::content(text).into()),
        }
    }

    /// Appends events for a parsed payload.
    ///
    /// Metadata comes first so the client sees it before the reply streams
    /// in: extraction, then completion, then the reply as prose.
    pub fn payload(&self, payload: StructuredPayload, out: &mut Vec<StreamFrame>) {
        if let Some(fields) = payload.extracted_fields.filter(|f| !f.is_empty()) {
            out.push(OutboundEvent::extraction(fields).into());
        }
        if let Some(is_complete) = payload.is_complete {
            out.push(OutboundEvent::complete(is_complete).into());
        }
        if let Some(reply) = payload.reply {
            self.prose(&reply, out);
        }
    }
}
