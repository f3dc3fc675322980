//! Outbound event types for a streamed project chat turn.
//!
//! Each event becomes one `data: <json>` frame on the wire. A turn that
//! ends normally is closed by a [`StreamFrame::Done`] sentinel; a turn that
//! fails ends with an `error` event and no sentinel.

use serde::{Deserialize, Serialize};

use crate::domain::intake::ExtractionState;

/// Literal payload of the terminal frame.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A typed event delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// One unit of reply text for typewriter rendering.
    Content { content: String },
    /// Fields extracted or updated in this turn.
    Extraction { fields: ExtractionState },
    /// Whether the assistant considers the intake complete.
    Complete {
        #[serde(rename = "isComplete")]
        is_complete: bool,
    },
    /// The turn failed; nothing follows.
    Error { error: String },
}

impl OutboundEvent {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
        }
    }

    pub fn extraction(fields: ExtractionState) -> Self {
        Self::Extraction { fields }
    }

    pub fn complete(is_complete: bool) -> Self {
        Self::Complete { is_complete }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Returns true if this is the last event a stream may carry.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A unit of the outbound stream: an event or the end-of-stream sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Event(OutboundEvent),
    Done,
}

impl StreamFrame {
    /// The `data:` payload for this frame.
    pub fn data(&self) -> String {
        match self {
            StreamFrame::Event(event) => serde_json::to_string(event).unwrap_or_else(|e| {
                serde_json::json!({ "type": "error", "error": e.to_string() }).to_string()
            }),
            StreamFrame::Done => DONE_SENTINEL.to_string(),
        }
    }

    /// Returns true if no frame may follow this one.
    pub fn is_terminal(&self) -> bool {
        match self {
            StreamFrame::Event(event) => event.is_terminal(),
            StreamFrame::Done => true,
        }
    }

    /// The wrapped event, if any.
    pub fn event(&self) -> Option<&OutboundEvent> {
        match self {
            StreamFrame::Event(event) => Some(event),
            StreamFrame::Done => None,
        }
    }
}

impl From<OutboundEvent> for StreamFrame {
    fn from(event: OutboundEvent) -> Self {
        StreamFrame::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intake::ProjectField;

    mod wire_format {
        use super::*;

        #[test]
        fn content_frame() {
            let frame = StreamFrame::from(OutboundEvent::content("H"));
            assert_eq!(frame.data(), r#"{"type":"content","content":"H"}"#);
        }

        #[test]
        fn extraction_frame() {
            let fields = ExtractionState::new().with(ProjectField::Title, "Bees");
            let frame = StreamFrame::from(OutboundEvent::extraction(fields));
            assert_eq!(
                frame.data(),
                r#"{"type":"extraction","fields":{"title":"Bees"}}"#
            );
        }

        #[test]
        fn complete_frame_uses_camel_case_flag() {
            let frame = StreamFrame::from(OutboundEvent::complete(true));
            assert_eq!(frame.data(), r#"{"type":"complete","isComplete":true}"#);
        }

        #[test]
        fn error_frame() {
            let frame = StreamFrame::from(OutboundEvent::error("boom"));
            assert_eq!(frame.data(), r#"{"type":"error","error":"boom"}"#);
        }

        #[test]
        fn done_frame() {
            assert_eq!(StreamFrame::Done.data(), "[DONE]");
        }

        #[test]
        fn multibyte_content_is_not_escaped() {
            let frame = StreamFrame::from(OutboundEvent::content("你"));
            assert_eq!(frame.data(), r#"{"type":"content","content":"你"}"#);
        }
    }

    mod terminal {
        use super::*;

        #[test]
        fn error_and_done_are_terminal() {
            assert!(StreamFrame::Done.is_terminal());
            assert!(StreamFrame::from(OutboundEvent::error("x")).is_terminal());
        }

        #[test]
        fn other_events_are_not_terminal() {
            assert!(!StreamFrame::from(OutboundEvent::content("a")).is_terminal());
            assert!(!StreamFrame::from(OutboundEvent::complete(false)).is_terminal());
            assert!(!StreamFrame::from(OutboundEvent::extraction(ExtractionState::new()))
                .is_terminal());
        }
    }

    #[test]
    fn client_can_parse_events_back() {
        let json = r#"{"type":"complete","isComplete":false}"#;
        let event: OutboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, OutboundEvent::complete(false));
    }
}
