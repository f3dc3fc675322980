//! Fence scanner.
//!
//! Splits the incoming delta stream into prose and the body of one embedded
//! ```json block. Marker detection runs over the concatenated stream, not
//! per delta: a trailing fragment that could still grow into a marker is
//! held back until the next delta (or the end of the stream) settles it.
//! A marker may therefore be split across any number of deltas, and text
//! sharing a delta with a marker lands on the correct side of it.
//!
//! Only the first block of a turn is honoured. Once it closes, everything
//! that follows is prose, including any further fences.

/// Opens a structured block.
pub const OPEN_FENCE: &str = "```json";

/// Closes a structured block.
pub const CLOSE_FENCE: &str = "```";

/// Which side of a fence the scanner is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Prose,
    InStructuredBlock,
}

/// Output of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text to forward to the client as-is.
    Prose(String),
    /// Raw text found between the opening and closing fence.
    Block(String),
}

/// Stateful fence scanner. One instance per turn.
#[derive(Debug, Default)]
pub struct FenceScanner {
    mode: ScanMode,
    /// Trailing text that may be the start of the next marker.
    carry: String,
    block: String,
    block_seen: bool,
}

impl FenceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// True once a block has been closed in this turn.
    pub fn has_seen_block(&self) -> bool {
        self.block_seen
    }

    /// Feeds one delta and returns the segments it settles, in order.
    pub fn push(&mut self, delta: &str) -> Vec<Segment> {
        let mut text = std::mem::take(&mut self.carry);
        text.push_str(delta);

        let mut segments = Vec::new();
        let mut rest = text.as_str();

        loop {
            match self.mode {
                ScanMode::Prose if self.block_seen => {
                    push_prose(&mut segments, rest);
                    break;
                }
                ScanMode::Prose => match rest.find(OPEN_FENCE) {
                    Some(idx) => {
                        push_prose(&mut segments, &rest[..idx]);
                        tracing::debug!("Structured block opened");
                        self.mode = ScanMode::InStructuredBlock;
                        self.block.clear();
                        rest = &rest[idx + OPEN_FENCE.len()..];
                    }
                    None => {
                        let split = rest.len() - partial_marker_len(rest, OPEN_FENCE);
                        push_prose(&mut segments, &rest[..split]);
                        self.carry.push_str(&rest[split..]);
                        break;
                    }
                },
                ScanMode::InStructuredBlock => match rest.find(CLOSE_FENCE) {
                    Some(idx) => {
                        self.block.push_str(&rest[..idx]);
                        tracing::debug!(len = self.block.len(), "Structured block closed");
                        self.mode = ScanMode::Prose;
                        self.block_seen = true;
                        segments.push(Segment::Block(std::mem::take(&mut self.block)));
                        rest = &rest[idx + CLOSE_FENCE.len()..];
                    }
                    None => {
                        let split = rest.len() - partial_marker_len(rest, CLOSE_FENCE);
                        self.block.push_str(&rest[..split]);
                        self.carry.push_str(&rest[split..]);
                        break;
                    }
                },
            }
        }

        segments
    }

    /// Ends the stream.
    ///
    /// Held-back prose is released. A block that never closed is dropped
    /// without a parse attempt.
    pub fn finish(self) -> Option<Segment> {
        match self.mode {
            ScanMode::Prose if !self.carry.is_empty() => Some(Segment::Prose(self.carry)),
            ScanMode::Prose => None,
            ScanMode::InStructuredBlock => {
                tracing::debug!(
                    len = self.block.len() + self.carry.len(),
                    "Dropping unterminated structured block"
                );
                None
            }
        }
    }
}

fn push_prose(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Prose(text.to_string()));
    }
}

/// Length of the longest proper prefix of `marker` that `text` ends with.
fn partial_marker_len(text: &str, marker: &str) -> usize {
    (1..marker.len())
        .rev()
        .find(|&len| text.ends_with(&marker[..len]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(text: &str) -> Segment {
        Segment::Prose(text.to_string())
    }

    fn block(text: &str) -> Segment {
        Segment::Block(text.to_string())
    }

    /// Feeds all deltas and finishes, collecting every segment.
    fn scan(deltas: &[&str]) -> Vec<Segment> {
        let mut scanner = FenceScanner::new();
        let mut segments: Vec<Segment> = deltas.iter().flat_map(|d| scanner.push(d)).collect();
        segments.extend(scanner.finish());
        segments
    }

    mod marker_aligned {
        use super::*;

        #[test]
        fn prose_only_passes_through() {
            assert_eq!(scan(&["Hello", " there"]), vec![prose("Hello"), prose(" there")]);
        }

        #[test]
        fn markers_as_own_deltas() {
            let segments = scan(&["Hi", "```json", "{\"reply\":\"ok\"}", "```", "bye"]);
            assert_eq!(
                segments,
                vec![prose("Hi"), block("{\"reply\":\"ok\"}"), prose("bye")]
            );
        }

        #[test]
        fn block_content_across_many_deltas() {
            let segments = scan(&["```json", "{\"a\":", "1", "}", "```"]);
            assert_eq!(segments, vec![block("{\"a\":1}")]);
        }

        #[test]
        fn empty_block() {
            assert_eq!(scan(&["```json", "```"]), vec![block("")]);
        }
    }

    mod split_markers {
        use super::*;

        #[test]
        fn opening_fence_split_across_deltas() {
            let segments = scan(&["``", "`json", "{}", "```"]);
            assert_eq!(segments, vec![block("{}")]);
        }

        #[test]
        fn opening_fence_split_into_single_characters() {
            let mut deltas: Vec<&str> = vec!["`", "`", "`", "j", "s", "o", "n"];
            deltas.extend(["{}", "`", "``"]);
            assert_eq!(scan(&deltas), vec![block("{}")]);
        }

        #[test]
        fn closing_fence_split_across_deltas() {
            let segments = scan(&["```json", "{\"x\":\"y\"}`", "``", "done"]);
            assert_eq!(segments, vec![block("{\"x\":\"y\"}"), prose("done")]);
        }

        #[test]
        fn content_sharing_a_delta_with_markers() {
            let segments = scan(&["Sure! ```json\n{\"reply\":\"hi\"}\n```\nThanks"]);
            assert_eq!(
                segments,
                vec![
                    prose("Sure! "),
                    block("\n{\"reply\":\"hi\"}\n"),
                    prose("\nThanks")
                ]
            );
        }

        #[test]
        fn partial_prefix_held_until_disambiguated() {
            let mut scanner = FenceScanner::new();

            assert_eq!(scanner.push("Look: ``"), vec![prose("Look: ")]);
            assert_eq!(scanner.mode(), ScanMode::Prose);

            assert_eq!(scanner.push("`py"), vec![prose("```py")]);
            assert_eq!(scanner.finish(), None);
        }

        #[test]
        fn held_prefix_released_at_stream_end() {
            assert_eq!(scan(&["tick `"]), vec![prose("tick "), prose("`")]);
        }

        #[test]
        fn other_fence_languages_are_prose() {
            let segments = scan(&["```rust\nfn main() {}\n```"]);
            let text: String = segments
                .iter()
                .map(|s| match s {
                    Segment::Prose(t) => t.as_str(),
                    Segment::Block(_) => panic!("unexpected block"),
                })
                .collect();
            assert_eq!(text, "```rust\nfn main() {}\n```");
        }
    }

    mod block_policy {
        use super::*;

        #[test]
        fn only_first_block_is_honoured() {
            let segments = scan(&["```json", "{}", "```", "```json", "{\"b\":1}", "```"]);
            assert_eq!(
                segments,
                vec![
                    block("{}"),
                    prose("```json"),
                    prose("{\"b\":1}"),
                    prose("```")
                ]
            );
        }

        #[test]
        fn has_seen_block_after_close() {
            let mut scanner = FenceScanner::new();
            scanner.push("```json");
            assert!(!scanner.has_seen_block());
            assert_eq!(scanner.mode(), ScanMode::InStructuredBlock);

            scanner.push("{}```");
            assert!(scanner.has_seen_block());
            assert_eq!(scanner.mode(), ScanMode::Prose);
        }

        #[test]
        fn unterminated_block_is_dropped() {
            let segments = scan(&["before", "```json", "{\"reply\":\"lost\"}"]);
            assert_eq!(segments, vec![prose("before")]);
        }

        #[test]
        fn unterminated_block_with_partial_close_is_dropped() {
            assert_eq!(scan(&["```json", "{}", "``"]), vec![]);
        }
    }

    mod partial_marker {
        use super::*;

        #[test]
        fn finds_longest_prefix() {
            assert_eq!(partial_marker_len("abc```js", OPEN_FENCE), 5);
            assert_eq!(partial_marker_len("abc`", OPEN_FENCE), 1);
            assert_eq!(partial_marker_len("abc", OPEN_FENCE), 0);
            assert_eq!(partial_marker_len("x``", CLOSE_FENCE), 2);
        }

        #[test]
        fn full_marker_is_not_a_partial() {
            assert_eq!(partial_marker_len("```", CLOSE_FENCE), 2);
        }

        #[test]
        fn multibyte_text_is_safe() {
            assert_eq!(partial_marker_len("你好", OPEN_FENCE), 0);
            assert_eq!(partial_marker_len("你好`", OPEN_FENCE), 1);
        }
    }
}
