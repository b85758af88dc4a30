//! Stream translator: upstream SSE to OpenAI `chat.completion.chunk` SSE.
//!
//! ```text
//! idle -> thinking -> answering -> done
//!              \          ^
//!               tool_call / other (accumulator)
//! ```
//!
//! The translator is push-driven: the caller feeds raw body bytes and writes
//! out whatever events come back, so nothing beyond one partial line is ever
//! buffered. The terminal `[DONE]` marker is produced exactly once, by
//! `emit_done`.

mod formatters;
mod line_buffer;
mod state;
mod thinking;
mod tool_calls;


pub use formatters::{sse_line, ChunkFactory, SseEvent, DONE_LINE, SYSTEM_FINGERPRINT};
pub use line_buffer::{data_payload, SseLineBuffer};
pub use state::{StreamState, TranslatorPhase};
pub use thinking::{answer_after_close, thinking_text, THINKING_CLOSE};
pub use tool_calls::{ToolCall, ToolCallAccumulator};

use serde_json::Value;
use zai_gateway_types::protocol::{ErrorEnvelope, EventData, Phase, UpstreamEnvelope};
use zai_gateway_types::{ProxyError, ThinkingMode};

/// Lines longer than this are truncated in warnings.
const LOG_PREVIEW_CHARS: usize = 200;

pub struct StreamTranslator {
    lines: SseLineBuffer,
    state: StreamState,
    factory: ChunkFactory,
    mode: ThinkingMode,
}

impl StreamTranslator {
    /// `client_tools` enables the tool-call accumulator; pass `Some` when the
    /// upstream body carries tools or MCP servers.
    pub fn new(factory: ChunkFactory, mode: ThinkingMode, client_tools: Option<Vec<String>>) -> Self {
        Self {
            lines: SseLineBuffer::new(),
            state: StreamState::new(client_tools.map(ToolCallAccumulator::new)),
            factory,
            mode,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Whether anything has been handed to the client yet.
    pub fn has_output(&self) -> bool {
        self.state.emitted > 0
    }

    /// Feed raw body bytes; returns the events completed lines produced.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        if self.is_done() {
            return out;
        }
        self.lines.extend(bytes);
        while let Some(line) = self.lines.next_line() {
            self.handle_line(&line, &mut out);
            if self.is_done() {
                break;
            }
        }
        self.count(&out);
        out
    }

    /// End of input: flush a trailing unterminated line and close the stream.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut out = Vec::new();
        if !self.is_done() {
            if let Some(line) = self.lines.take_remainder() {
                self.handle_line(&line, &mut out);
            }
            self.terminate(&mut out);
        }
        self.count(&out);
        out
    }

    /// Abort with an in-band error followed by the terminal marker.
    pub fn fail(&mut self, envelope: ErrorEnvelope) -> Vec<SseEvent> {
        let mut out = Vec::new();
        if !self.is_done() {
            out.push(SseEvent::Error(envelope));
            self.emit_done(&mut out);
        }
        self.count(&out);
        out
    }

    fn count(&mut self, out: &[SseEvent]) {
        self.state.emitted += out.len();
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<SseEvent>) {
        let Some(payload) = data_payload(line) else {
            return;
        };
        if payload.is_empty() {
            return;
        }
        if payload == "[DONE]" {
            tracing::debug!("Upstream sent [DONE]");
            self.terminate(out);
            return;
        }

        match serde_json::from_str::<UpstreamEnvelope>(payload) {
            Ok(envelope) => self.handle_event(envelope.data, out),
            Err(e) => {
                let error = ProxyError::Translation {
                    message: format!("{e}: {}", preview(payload)),
                };
                tracing::warn!("Skipping upstream line: {}", error);
            },
        }
    }

    fn handle_event(&mut self, data: EventData, out: &mut Vec<SseEvent>) {
        if let Some(phase) = &data.phase {
            self.state.observe_phase(phase);
        }

        match &data.phase {
            Some(Phase::Thinking) => self.on_thinking(&data, out),
            Some(Phase::Answer) => self.on_answer(&data, out),
            Some(phase @ (Phase::ToolCall | Phase::Other)) => {
                let is_other = *phase == Phase::Other;
                self.on_tool_phase(is_other, &data, out);
            },
            Some(Phase::Unknown(name)) => tracing::debug!("Ignoring unknown upstream phase: {}", name),
            None => {},
        }

        if !self.is_done() {
            if let Some(usage) = data.usage {
                self.on_usage(usage, out);
            }
        }
    }

    fn on_thinking(&mut self, data: &EventData, out: &mut Vec<SseEvent>) {
        self.state.phase = TranslatorPhase::Thinking;
        let text = thinking_text(data.delta(), self.mode);
        if text.is_empty() {
            return;
        }
        self.ensure_role(out);
        let chunk = match self.mode {
            ThinkingMode::Think => self.factory.thinking(text),
            ThinkingMode::Strip | ThinkingMode::Raw => self.factory.content(text),
        };
        out.push(SseEvent::Chunk(chunk));
        self.state.thinking_emitted = true;
    }

    fn on_answer(&mut self, data: &EventData, out: &mut Vec<SseEvent>) {
        self.state.phase = TranslatorPhase::Answering;

        if let Some(after) = answer_after_close(data.edit()) {
            self.close_thinking(out);
            if !after.is_empty() {
                self.ensure_role(out);
                out.push(SseEvent::Chunk(self.factory.content(after)));
            }
        } else if !data.delta().is_empty() {
            self.ensure_role(out);
            out.push(SseEvent::Chunk(self.factory.content(data.delta())));
        }
    }

    fn close_thinking(&mut self, out: &mut Vec<SseEvent>) {
        if self.state.thinking_closed {
            return;
        }
        self.state.thinking_closed = true;
        if !self.state.thinking_emitted {
            return;
        }
        match self.mode {
            ThinkingMode::Think => {
                let signature = chrono::Utc::now().timestamp_millis().to_string();
                out.push(SseEvent::Chunk(self.factory.signature(&signature)));
            },
            ThinkingMode::Raw => out.push(SseEvent::Chunk(self.factory.content(THINKING_CLOSE))),
            ThinkingMode::Strip => {},
        }
    }

    fn on_tool_phase(&mut self, is_other: bool, data: &EventData, out: &mut Vec<SseEvent>) {
        let Some(accumulator) = self.state.accumulator.as_mut() else {
            tracing::debug!("Tool phase event without tools in request, ignoring");
            return;
        };
        self.state.phase = TranslatorPhase::ToolCall;

        let mut calls = accumulator.apply(data);
        if is_other {
            calls.extend(accumulator.settle());
        }
        for call in calls {
            self.ensure_role(out);
            let chunk = self.factory.tool_call(call.index, &call.id, &call.name, &call.arguments);
            out.push(SseEvent::Chunk(chunk));
        }

        // `other` after a tool call marks the end of the invocation
        if is_other && self.state.has_tool_call() {
            self.finish_tool_calls(data.usage.clone(), out);
        }
    }

    fn on_usage(&mut self, usage: Value, out: &mut Vec<SseEvent>) {
        if self.state.has_tool_call() {
            self.finish_tool_calls(Some(usage), out);
            return;
        }
        out.push(SseEvent::Chunk(self.factory.stop(Some(usage))));
        self.emit_done(out);
    }

    fn finish_tool_calls(&mut self, usage: Option<Value>, out: &mut Vec<SseEvent>) {
        if self.is_done() {
            return;
        }
        out.push(SseEvent::Chunk(self.factory.tool_calls_finished(usage)));
        self.emit_done(out);
    }

    /// Close the response without an upstream usage event.
    fn terminate(&mut self, out: &mut Vec<SseEvent>) {
        if self.state.has_tool_call() {
            self.finish_tool_calls(None, out);
        } else {
            self.emit_done(out);
        }
    }

    fn ensure_role(&mut self, out: &mut Vec<SseEvent>) {
        if !self.state.role_announced {
            self.state.role_announced = true;
            out.push(SseEvent::Chunk(self.factory.role()));
        }
    }

    fn emit_done(&mut self, out: &mut Vec<SseEvent>) {
        if !self.is_done() {
            self.state.phase = TranslatorPhase::Done;
            out.push(SseEvent::Done);
        }
    }
}

fn preview(line: &str) -> String {
    if line.chars().count() <= LOG_PREVIEW_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(LOG_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
