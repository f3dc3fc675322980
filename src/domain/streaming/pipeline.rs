//! Per-turn streaming pipeline: fence scanner, payload parser, multiplexer.
//!
//! Deltas must be pushed in arrival order. The pipeline is consumed when
//! the turn ends, so nothing can be emitted after the sentinel or after an
//! error event.

use super::events::{OutboundEvent, StreamFrame};
use super::fence::{FenceScanner, Segment};
use super::multiplexer::{EmissionGranularity, Multiplexer};
use super::payload::StructuredPayload;
use crate::domain::intake::ExtractionState;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnOutcome {
    /// Still running.
    #[default]
    Open,
    /// Upstream finished and the sentinel was emitted.
    Completed,
    /// An error event ended the turn.
    Failed,
    /// The turn was abandoned (client gone or upstream aborted by caller).
    Cancelled,
}

/// What happened during a turn, for logging and callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Number of deltas pushed.
    pub deltas: usize,
    /// Number of `content` events produced.
    pub content_events: usize,
    /// A structured block was closed and parsed.
    pub payload_parsed: bool,
    /// A structured block was closed but could not be parsed.
    pub payload_rejected: bool,
    /// Fields carried by the parsed payload.
    pub extracted: ExtractionState,
    /// Completion flag carried by the parsed payload.
    pub is_complete: Option<bool>,
    pub outcome: TurnOutcome,
}

/// Streaming state for one turn.
#[derive(Debug, Default)]
pub struct TurnPipeline {
    scanner: FenceScanner,
    multiplexer: Multiplexer,
    summary: TurnSummary,
}

impl TurnPipeline {
    pub fn new(granularity: EmissionGranularity) -> Self {
        Self {
            scanner: FenceScanner::new(),
            multiplexer: Multiplexer::new(granularity),
            summary: TurnSummary::default(),
        }
    }

    /// Processes one upstream delta.
    pub fn push(&mut self, delta: &str) -> Vec<StreamFrame> {
        self.summary.deltas += 1;
        let mut frames = Vec::new();
        for segment in self.scanner.push(delta) {
            self.emit(segment, &mut frames);
        }
        self.count_content(&frames);
        frames
    }

    /// Ends the turn normally, flushing held-back prose and appending the
    /// sentinel.
    pub fn finish(mut self) -> (Vec<StreamFrame>, TurnSummary) {
        let mut frames = Vec::new();
        if let Some(segment) = std::mem::take(&mut self.scanner).finish() {
            self.emit(segment, &mut frames);
        }
        self.count_content(&frames);
        frames.push(StreamFrame::Done);
        self.summary.outcome = TurnOutcome::Completed;
        (frames, self.summary)
    }

    /// Ends the turn with an error event. Buffered block text is discarded.
    pub fn fail(mut self, message: impl Into<String>) -> (StreamFrame, TurnSummary) {
        self.summary.outcome = TurnOutcome::Failed;
        (OutboundEvent::error(message).into(), self.summary)
    }

    /// Abandons the turn without emitting anything further.
    pub fn cancel(mut self) -> TurnSummary {
        self.summary.outcome = TurnOutcome::Cancelled;
        self.summary
    }

    fn emit(&mut self, segment: Segment, frames: &mut Vec<StreamFrame>) {
        match segment {
            Segment::Prose(text) => self.multiplexer.prose(&text, frames),
            Segment::Block(raw) => match StructuredPayload::parse(&raw) {
                Ok(payload) => {
                    self.summary.payload_parsed = true;
                    self.summary.is_complete = payload.is_complete;
                    if let Some(fields) = &payload.extracted_fields {
                        self.summary.extracted.merge(fields);
                    }
                    self.multiplexer.payload(payload, frames);
                }
                Err(e) => {
                    self.summary.payload_rejected = true;
                    tracing::warn!(error = %e, block = %raw, "Discarding malformed structured block");
                }
            },
        }
    }

    fn count_content(&mut self, frames: &[StreamFrame]) {
        self.summary.content_events += frames
            .iter()
            .filter(|f| matches!(f.event(), Some(OutboundEvent::Content { .. })))
            .count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intake::ProjectField;
    use proptest::prelude::*;

    fn run(granularity: EmissionGranularity, deltas: &[&str]) -> (Vec<StreamFrame>, TurnSummary) {
        let mut pipeline = TurnPipeline::new(granularity);
        let mut frames: Vec<StreamFrame> = deltas.iter().flat_map(|d| pipeline.push(d)).collect();
        let (tail, summary) = pipeline.finish();
        frames.extend(tail);
        (frames, summary)
    }

    fn content(text: &str) -> StreamFrame {
        OutboundEvent::content(text).into()
    }

    mod event_order {
        use super::*;

        #[test]
        fn grapheme_split_across_deltas_concatenates_back() {
            let (frames, _) = run(EmissionGranularity::Character, &["👍", "\u{1F3FD}"]);

            assert_eq!(
                frames,
                vec![content("👍"), content("\u{1F3FD}"), StreamFrame::Done]
            );
        }

        #[test]
        fn grapheme_within_one_delta_stays_whole() {
            let (frames, _) = run(EmissionGranularity::Character, &["👍\u{1F3FD}!"]);

            assert_eq!(
                frames,
                vec![content("👍\u{1F3FD}"), content("!"), StreamFrame::Done]
            );
        }

        #[test]
        fn reply_block_between_prose() {
            let (frames, summary) = run(
                EmissionGranularity::Character,
                &["Hi", "```json", "{\"reply\":\"ok\",\"is_complete\":true}", "```", "bye"],
            );

            assert_eq!(
                frames,
                vec![
                    content("H"),
                    content("i"),
                    OutboundEvent::complete(true).into(),
                    content("o"),
                    content("k"),
                    content("b"),
                    content("y"),
                    content("e"),
                    StreamFrame::Done,
                ]
            );
            assert!(summary.payload_parsed);
            assert_eq!(summary.is_complete, Some(true));
            assert_eq!(summary.content_events, 7);
            assert_eq!(summary.deltas, 5);
            assert_eq!(summary.outcome, TurnOutcome::Completed);
        }

        #[test]
        fn extraction_then_complete_then_reply() {
            let (frames, summary) = run(
                EmissionGranularity::Chunk,
                &[
                    "```json\n",
                    r#"{"extracted_fields":{"title":"Bees"},"reply":"Nice!","is_complete":false}"#,
                    "\n```",
                ],
            );

            let fields = ExtractionState::new().with(ProjectField::Title, "Bees");
            assert_eq!(
                frames,
                vec![
                    OutboundEvent::extraction(fields.clone()).into(),
                    OutboundEvent::complete(false).into(),
                    content("Nice!"),
                    StreamFrame::Done,
                ]
            );
            assert_eq!(summary.extracted, fields);
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn malformed_block_emits_only_sentinel() {
            let (frames, summary) =
                run(EmissionGranularity::Character, &["```json", "{bad json", "```"]);

            assert_eq!(frames, vec![StreamFrame::Done]);
            assert!(summary.payload_rejected);
            assert!(!summary.payload_parsed);
        }

        #[test]
        fn malformed_block_keeps_surrounding_prose() {
            let (frames, _) = run(
                EmissionGranularity::Chunk,
                &["before", "```json", "{oops", "```", "after"],
            );
            assert_eq!(
                frames,
                vec![content("before"), content("after"), StreamFrame::Done]
            );
        }

        #[test]
        fn unclosed_block_yields_no_payload_events() {
            let (frames, summary) = run(
                EmissionGranularity::Chunk,
                &["intro", "```json", "{\"reply\":\"never\",\"is_complete\":true}"],
            );
            assert_eq!(frames, vec![content("intro"), StreamFrame::Done]);
            assert!(!summary.payload_parsed);
        }

        #[test]
        fn fail_produces_single_error_event() {
            let mut pipeline = TurnPipeline::new(EmissionGranularity::Chunk);
            let first = pipeline.push("partial ");
            let (frame, summary) = pipeline.fail("provider unavailable: down");

            assert_eq!(first, vec![content("partial ")]);
            assert_eq!(frame, OutboundEvent::error("provider unavailable: down").into());
            assert_eq!(summary.outcome, TurnOutcome::Failed);
        }

        #[test]
        fn cancel_discards_open_block() {
            let mut pipeline = TurnPipeline::new(EmissionGranularity::Chunk);
            pipeline.push("```json");
            pipeline.push("{\"reply\":\"x\"");
            let summary = pipeline.cancel();

            assert_eq!(summary.outcome, TurnOutcome::Cancelled);
            assert!(!summary.payload_parsed);
        }
    }

    mod properties {
        use super::*;

        fn text_of(frames: &[StreamFrame]) -> String {
            frames
                .iter()
                .filter_map(|f| match f.event() {
                    Some(OutboundEvent::Content { content }) => Some(content.as_str()),
                    _ => None,
                })
                .collect()
        }

        proptest! {
            #[test]
            fn prose_only_is_reproduced_one_char_per_event(
                deltas in prop::collection::vec("[a-zA-Z0-9 .,!?\\n你好é]{0,12}", 0..12)
            ) {
                let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
                let (frames, _) = run(EmissionGranularity::Character, &refs);

                let expected: String = deltas.concat();
                prop_assert_eq!(text_of(&frames), expected.clone());
                prop_assert_eq!(frames.len(), expected.chars().count() + 1);
                prop_assert_eq!(frames.last(), Some(&StreamFrame::Done));
            }

            #[test]
            fn independent_pipelines_are_deterministic(
                deltas in prop::collection::vec("[a-z`{}\":, ]{0,8}|```json|```", 0..16)
            ) {
                let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
                let first = run(EmissionGranularity::Character, &refs);
                let second = run(EmissionGranularity::Character, &refs);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn split_points_do_not_change_output(
                text in "[a-z ]{0,6}(```json\\{\"reply\":\"[a-z]{0,5}\"\\}```)?[a-z ]{0,6}",
                cut in 0usize..64,
            ) {
                let cut = cut.min(text.len());
                let whole = run(EmissionGranularity::Character, &[text.as_str()]);
                let split = run(EmissionGranularity::Character, &[&text[..cut], &text[cut..]]);
                prop_assert_eq!(whole.0, split.0);
            }
        }
    }
}
