//! Project chat handler.
//!
//! Runs one conversational turn: builds the upstream request from the
//! client's history and extraction state, streams the reply through a
//! [`TurnPipeline`] and forwards every frame to a channel in order.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::decoder::{decode_deltas, UpstreamStreamError};
use crate::config::ChatConfig;
use crate::domain::intake::{ConversationTurn, ExtractionState, PromptTemplate};
use crate::domain::streaming::{
    EmissionGranularity, StreamFrame, TurnOutcome, TurnPipeline, TurnSummary,
};
use crate::ports::{AIProvider, CompletionRequest, MessageRole};

/// Frames buffered between the turn task and the HTTP response.
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// One user message plus the state the client carries between turns.
#[derive(Debug, Clone)]
pub struct ProjectChatCommand {
    pub message: String,
    pub chat_history: Vec<ConversationTurn>,
    pub extracted_fields: ExtractionState,
}

impl ProjectChatCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chat_history: Vec::new(),
            extracted_fields: ExtractionState::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.chat_history = history;
        self
    }

    pub fn with_fields(mut self, fields: ExtractionState) -> Self {
        self.extracted_fields = fields;
        self
    }
}

/// Per-process settings for the handler.
#[derive(Debug, Clone)]
pub struct ProjectChatSettings {
    pub prompt: PromptTemplate,
    pub temperature: f32,
    pub granularity: EmissionGranularity,
}

impl Default for ProjectChatSettings {
    fn default() -> Self {
        Self {
            prompt: PromptTemplate::default(),
            temperature: 0.7,
            granularity: EmissionGranularity::default(),
        }
    }
}

impl From<&ChatConfig> for ProjectChatSettings {
    fn from(config: &ChatConfig) -> Self {
        let mut prompt = PromptTemplate::default();
        if let Some(system_prompt) = &config.system_prompt {
            prompt = prompt.with_system_prompt(system_prompt.clone());
        }
        if let Some(guidance) = &config.guidance {
            prompt = prompt.with_guidance(guidance.clone());
        }
        Self {
            prompt,
            temperature: config.temperature,
            granularity: config.granularity,
        }
    }
}

/// Outcome of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub summary: TurnSummary,
    /// The client's fields with this turn's extraction merged in.
    pub fields: ExtractionState,
}

/// Handler for project creation chat turns.
pub struct ProjectChatHandler {
    provider: Arc<dyn AIProvider>,
    settings: ProjectChatSettings,
}

impl ProjectChatHandler {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ProjectChatSettings) -> Self {
        Self { provider, settings }
    }

    /// Builds the upstream request: system prompt, history, then the new message.
    pub fn build_request(&self, command: &ProjectChatCommand, trace_id: &str) -> CompletionRequest {
        CompletionRequest::new(trace_id)
            .with_system_prompt(self.settings.prompt.render(&command.extracted_fields))
            .with_history(&command.chat_history)
            .with_message(MessageRole::User, command.message.clone())
            .with_temperature(self.settings.temperature)
    }

    /// Spawns the turn and returns the receiving end of its frames.
    ///
    /// Dropping the receiver or cancelling `cancel` stops the turn.
    pub fn start(
        self: &Arc<Self>,
        command: ProjectChatCommand,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamFrame> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            handler.handle(command, tx, cancel).await;
        });
        rx
    }

    /// Runs a turn to completion, sending frames to `sink`.
    ///
    /// A normal turn ends with [`StreamFrame::Done`]; a failed one with a
    /// single error event. On cancellation, or once `sink` is closed,
    /// nothing more is sent and any open block is discarded.
    pub async fn handle(
        &self,
        command: ProjectChatCommand,
        sink: mpsc::Sender<StreamFrame>,
        cancel: CancellationToken,
    ) -> TurnReport {
        let trace_id = Uuid::new_v4().to_string();
        let info = self.provider.provider_info();
        tracing::info!(
            trace_id = %trace_id,
            provider = %info.name,
            model = %info.model,
            history = command.chat_history.len(),
            fields = command.extracted_fields.len(),
            "Project chat turn started"
        );

        let request = self.build_request(&command, &trace_id);
        let fields = command.extracted_fields;
        let mut pipeline = TurnPipeline::new(self.settings.granularity);

        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return finish_turn(&trace_id, pipeline.cancel(), fields);
            }
            started = self.provider.stream_complete(request) => started,
        };

        let mut deltas = match started {
            Ok(chunks) => decode_deltas(chunks),
            Err(e) => {
                let summary = fail_turn(&trace_id, pipeline, e.into(), &sink).await;
                return finish_turn(&trace_id, summary, fields);
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return finish_turn(&trace_id, pipeline.cancel(), fields);
                }
                next = deltas.next() => next,
            };

            match next {
                Some(Ok(delta)) => {
                    for frame in pipeline.push(&delta) {
                        if sink.send(frame).await.is_err() {
                            tracing::debug!(trace_id = %trace_id, "Client disconnected");
                            return finish_turn(&trace_id, pipeline.cancel(), fields);
                        }
                    }
                }
                Some(Err(e)) => {
                    let summary = fail_turn(&trace_id, pipeline, e, &sink).await;
                    return finish_turn(&trace_id, summary, fields);
                }
                None => {
                    let (frames, mut summary) = pipeline.finish();
                    for frame in frames {
                        if sink.send(frame).await.is_err() {
                            summary.outcome = TurnOutcome::Cancelled;
                            break;
                        }
                    }
                    return finish_turn(&trace_id, summary, fields);
                }
            }
        }
    }
}

async fn fail_turn(
    trace_id: &str,
    pipeline: TurnPipeline,
    error: UpstreamStreamError,
    sink: &mpsc::Sender<StreamFrame>,
) -> TurnSummary {
    tracing::warn!(trace_id = %trace_id, error = %error, "Upstream stream failed");
    let (frame, summary) = pipeline.fail(error.to_string());
    // A closed sink means the client is gone; there is no one left to tell.
    let _ = sink.send(frame).await;
    summary
}

fn finish_turn(trace_id: &str, summary: TurnSummary, mut fields: ExtractionState) -> TurnReport {
    let changed = fields.merge(&summary.extracted);
    tracing::info!(
        trace_id = %trace_id,
        outcome = ?summary.outcome,
        deltas = summary.deltas,
        content_events = summary.content_events,
        payload_parsed = summary.payload_parsed,
        payload_rejected = summary.payload_rejected,
        is_complete = ?summary.is_complete,
        changed_fields = changed.len(),
        missing_required = ?fields.missing_required(),
        "Project chat turn finished"
    );
    TurnReport { summary, fields }
}
