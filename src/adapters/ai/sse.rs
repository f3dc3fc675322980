//! Server-Sent Events decoding for OpenAI-compatible chat completion streams.
//!
//! Network chunks do not respect line boundaries, and a multi-byte UTF-8
//! character may be split between two chunks. The decoder keeps the raw
//! bytes of the unfinished line and only decodes a line once its newline
//! has arrived.

use serde::Deserialize;

use crate::ports::{AIError, FinishReason, StreamChunk};

/// Payload that marks the end of an OpenAI stream.
const DONE_MARKER: &str = "[DONE]";

/// Incremental SSE decoder. One instance per upstream response.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds raw bytes and returns every chunk completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        let mut results = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.decode_line(&line, &mut results);
            } else {
                self.line.push(byte);
            }
        }
        results
    }

    /// Decodes a trailing line that was not newline-terminated.
    pub fn finish(mut self) -> Vec<Result<StreamChunk, AIError>> {
        let mut results = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.decode_line(&line, &mut results);
        }
        results
    }

    fn decode_line(&mut self, raw: &[u8], results: &mut Vec<Result<StreamChunk, AIError>>) {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches('\r');

        // Blank separators, comments and `event:`/`id:` fields carry no text.
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data == DONE_MARKER {
            self.done = true;
            return;
        }
        if data.trim().is_empty() {
            return;
        }

        match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    results.push(Err(AIError::unavailable(error.message)));
                    return;
                }
                if let Some(choice) = chunk.choices.into_iter().next() {
                    if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                        results.push(Ok(StreamChunk::content(content)));
                    }
                    if let Some(reason) = choice.finish_reason {
                        results.push(Ok(StreamChunk::finished(FinishReason::from_provider(
                            &reason,
                        ))));
                    }
                }
            }
            Err(e) => results.push(Err(AIError::parse(format!(
                "Failed to parse SSE chunk: {}",
                e
            )))),
        }
    }
}

// ----- OpenAI stream types -----

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default = "unknown_error")]
    message: String,
}

fn unknown_error() -> String {
    "upstream stream error".to_string()
}
