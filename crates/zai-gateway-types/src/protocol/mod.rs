//! Wire protocol definitions.
//!
//! - `openai` - inbound chat requests, model listing, error envelope
//! - `chunk` - outbound `chat.completion.chunk` stream values
//! - `upstream` - the chat backend's request body and SSE envelope

pub mod chunk;
pub mod openai;
pub mod upstream;

pub use chunk::{ChunkChoice, Delta, OutboundChunk, ThinkingDelta, ToolCallDelta, ToolCallFunction};
pub use openai::{
    ChatMessage, ChatRequest, ContentPart, ErrorBody, ErrorEnvelope, ImageUrl, MessageContent,
    ModelCard, ModelList,
};
pub use upstream::{
    BackgroundTasks, EventData, FeatureFlags, ModelItem, Phase, UpstreamEnvelope,
    UpstreamRequestBody,
};
