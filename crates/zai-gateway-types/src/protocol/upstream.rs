//! Chat backend wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::openai::ChatMessage;

/// POST body sent to the upstream chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamRequestBody {
    pub stream: bool,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub params: BTreeMap<String, Value>,
    pub features: FeatureFlags,
    pub background_tasks: BackgroundTasks,
    pub mcp_servers: Vec<String>,
    pub variables: BTreeMap<String, String>,
    pub model_item: ModelItem,
    pub chat_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    pub image_generation: bool,
    pub web_search: bool,
    pub auto_web_search: bool,
    pub preview_mode: bool,
    pub flags: Vec<String>,
    pub features: Vec<String>,
    pub enable_thinking: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackgroundTasks {
    pub title_generation: bool,
    pub tags_generation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelItem {
    pub id: String,
    pub name: String,
    pub owned_by: String,
}

/// One `data:` line of the upstream SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamEnvelope {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventData {
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub delta_content: Option<String>,
    #[serde(default)]
    pub edit_content: Option<String>,
    #[serde(default)]
    pub edit_index: Option<usize>,
    #[serde(default)]
    pub usage: Option<Value>,
}

impl EventData {
    pub fn delta(&self) -> &str {
        self.delta_content.as_deref().unwrap_or_default()
    }

    pub fn edit(&self) -> &str {
        self.edit_content.as_deref().unwrap_or_default()
    }
}

/// Answer stage reported by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    Thinking,
    Answer,
    ToolCall,
    Other,
    /// Any phase this gateway does not know about yet
    Unknown(String),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Thinking => "thinking",
            Phase::Answer => "answer",
            Phase::ToolCall => "tool_call",
            Phase::Other => "other",
            Phase::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "thinking" => Phase::Thinking,
            "answer" => Phase::Answer,
            "tool_call" => Phase::ToolCall,
            "other" => Phase::Other,
            _ => Phase::Unknown(raw),
        }
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
