use zai_gateway_types::protocol::Phase;

use super::tool_calls::ToolCallAccumulator;

/// Where the translator is within one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslatorPhase {
    #[default]
    Idle,
    Thinking,
    Answering,
    ToolCall,
    Done,
}

/// Per-request translation state. Lives for one attempt's stream.
#[derive(Debug, Default)]
pub struct StreamState {
    pub phase: TranslatorPhase,
    /// Last upstream phase seen, for transition logging
    pub last_phase: Option<Phase>,
    pub role_announced: bool,
    pub thinking_emitted: bool,
    pub thinking_closed: bool,
    /// Chunks handed to the client so far
    pub emitted: usize,
    /// Present only when the request carried tools or MCP servers
    pub accumulator: Option<ToolCallAccumulator>,
}

impl StreamState {
    pub fn new(accumulator: Option<ToolCallAccumulator>) -> Self {
        Self { accumulator, ..Default::default() }
    }

    pub fn observe_phase(&mut self, phase: &Phase) {
        if self.last_phase.as_ref() != Some(phase) {
            match &self.last_phase {
                Some(previous) => tracing::debug!("Upstream phase: {} -> {}", previous, phase),
                None => tracing::debug!("Upstream phase: {}", phase),
            }
            self.last_phase = Some(phase.clone());
        }
    }

    pub fn has_tool_call(&self) -> bool {
        self.accumulator.as_ref().is_some_and(ToolCallAccumulator::has_tool_call)
    }

    pub fn is_done(&self) -> bool {
        self.phase == TranslatorPhase::Done
    }
}
