// OpenAI SSE chunk builders
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use zai_gateway_types::protocol::{
    ChunkChoice, Delta, ErrorEnvelope, OutboundChunk, ThinkingDelta, ToolCallDelta,
    ToolCallFunction,
};

pub const CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const SYSTEM_FINGERPRINT: &str = "fp_zai_001";
pub const ASSISTANT_ROLE: &str = "assistant";

/// Terminal SSE line.
pub const DONE_LINE: &str = "data: [DONE]\n\n";

/// Format an SSE data line
#[inline]
pub fn sse_line<T: Serialize>(data: &T) -> Bytes {
    Bytes::from(format!("data: {}\n\n", serde_json::to_string(data).unwrap_or_default()))
}

/// One unit of client-bound output.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Chunk(OutboundChunk),
    Error(ErrorEnvelope),
    Done,
}

impl SseEvent {
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Chunk(chunk) => sse_line(chunk),
            Self::Error(envelope) => sse_line(envelope),
            Self::Done => Bytes::from_static(DONE_LINE.as_bytes()),
        }
    }

    pub fn as_chunk(&self) -> Option<&OutboundChunk> {
        match self {
            Self::Chunk(chunk) => Some(chunk),
            _ => None,
        }
    }
}

/// Stamps every chunk of one response with the same id, model and creation time.
#[derive(Debug, Clone)]
pub struct ChunkFactory {
    chat_id: String,
    model: String,
    created: i64,
}

impl ChunkFactory {
    pub fn new(chat_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self { chat_id: chat_id.into(), model: model.into(), created: chrono::Utc::now().timestamp() }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn chunk(&self, delta: Delta, finish_reason: Option<&str>, usage: Option<Value>) -> OutboundChunk {
        OutboundChunk {
            choices: vec![ChunkChoice {
                delta,
                finish_reason: finish_reason.map(str::to_string),
                index: 0,
                logprobs: None,
            }],
            created: self.created,
            id: self.chat_id.clone(),
            model: self.model.clone(),
            object: CHUNK_OBJECT.to_string(),
            system_fingerprint: SYSTEM_FINGERPRINT.to_string(),
            usage,
        }
    }

    fn assistant() -> Delta {
        Delta { role: Some(ASSISTANT_ROLE.to_string()), ..Default::default() }
    }

    pub fn role(&self) -> OutboundChunk {
        self.chunk(Self::assistant(), None, None)
    }

    pub fn thinking(&self, text: &str) -> OutboundChunk {
        let delta = Delta {
            thinking: Some(ThinkingDelta { content: text.to_string(), signature: None }),
            ..Self::assistant()
        };
        self.chunk(delta, None, None)
    }

    /// Closes the thinking block.
    pub fn signature(&self, signature: &str) -> OutboundChunk {
        let delta = Delta {
            thinking: Some(ThinkingDelta { content: String::new(), signature: Some(signature.to_string()) }),
            ..Self::assistant()
        };
        self.chunk(delta, None, None)
    }

    pub fn content(&self, text: &str) -> OutboundChunk {
        let delta = Delta { content: Some(text.to_string()), ..Self::assistant() };
        self.chunk(delta, None, None)
    }

    pub fn tool_call(&self, index: u32, id: &str, name: &str, arguments: &str) -> OutboundChunk {
        let delta = Delta {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: id.to_string(),
                call_type: "function".to_string(),
                function: ToolCallFunction { name: name.to_string(), arguments: arguments.to_string() },
            }]),
            ..Self::assistant()
        };
        self.chunk(delta, None, None)
    }

    /// Terminal chunk for a plain answer.
    pub fn stop(&self, usage: Option<Value>) -> OutboundChunk {
        let delta = Delta { content: Some(String::new()), ..Self::assistant() };
        self.chunk(delta, Some("stop"), usage)
    }

    /// Terminal chunk after one or more tool calls.
    pub fn tool_calls_finished(&self, usage: Option<Value>) -> OutboundChunk {
        self.chunk(Self::assistant(), Some("tool_calls"), usage)
    }
}
