//! Delta decoder.
//!
//! Reduces a provider chunk stream to the text deltas it carries. Chunks
//! without text (role announcements, finish markers) are skipped. The
//! stream ends after the first error.

use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use thiserror::Error;

use crate::ports::{AIError, ChunkStream, FinishReason};

/// Lazy sequence of text deltas from one upstream call.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamStreamError>> + Send>>;

/// The upstream call failed or was cut short.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamStreamError {
    #[error(transparent)]
    Provider(#[from] AIError),

    #[error("upstream aborted the response")]
    Aborted,
}

/// Wraps a provider chunk stream.
pub fn decode_deltas(chunks: ChunkStream) -> DeltaStream {
    Box::pin(stream::unfold(Some(chunks), |state| async move {
        let mut chunks = state?;
        loop {
            match chunks.next().await? {
                Ok(chunk) => {
                    match chunk.finish_reason {
                        Some(FinishReason::Error) => {
                            return Some((Err(UpstreamStreamError::Aborted), None));
                        }
                        Some(FinishReason::Stop) | None => {}
                        Some(reason) => {
                            tracing::debug!(?reason, "Upstream stopped early");
                        }
                    }
                    if !chunk.delta.is_empty() {
                        return Some((Ok(chunk.delta), Some(chunks)));
                    }
                }
                Err(e) => return Some((Err(e.into()), None)),
            }
        }
    }))
}
