//! Tool-call accumulator.
//!
//! Tool-call phases stream an edit log over one text buffer: each event
//! writes `edit_content` at `edit_index`. Invocations appear in that buffer as
//!
//! ```text
//! <glm_block view="">{"type":"mcp","data":{"metadata":{"id":..,"name":..,"arguments":".."}}}</glm_block>
//! ```
//!
//! Each complete block is parsed once, in buffer order. Blocks naming a tool
//! the client did not declare (upstream MCP capabilities such as web search)
//! are consumed but never surfaced. An unparseable block holds the scan only
//! while it is the last complete block; once a later block completes, or the
//! phase ends, it is dropped and the scan moves on.

use serde_json::Value;
use uuid::Uuid;
use zai_gateway_types::protocol::EventData;
use zai_gateway_types::ProxyError;

const BLOCK_OPEN: &str = "<glm_block";
const BLOCK_CLOSE: &str = "</glm_block>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub index: u32,
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    buffer: String,
    client_tools: Vec<String>,
    blocks_consumed: usize,
    calls: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    pub fn new(client_tools: Vec<String>) -> Self {
        Self { client_tools, ..Default::default() }
    }

    pub fn has_tool_call(&self) -> bool {
        !self.calls.is_empty()
    }

    pub fn calls(&self) -> &[ToolCall] {
        &self.calls
    }

    /// Apply one tool-call or other phase event; returns calls completed by it.
    pub fn apply(&mut self, data: &EventData) -> Vec<ToolCall> {
        match (data.edit_index, data.edit_content.as_deref()) {
            (Some(index), Some(edit)) => {
                if let Err(e) = self.splice(index, edit) {
                    tracing::warn!("{}; appending fragment", e);
                    self.buffer.push_str(edit);
                }
            },
            (None, Some(edit)) => self.buffer.push_str(edit),
            _ => {},
        }
        if let Some(delta) = data.delta_content.as_deref() {
            self.buffer.push_str(delta);
        }
        self.drain_blocks(false)
    }

    /// End of the tool-call phase: nothing can repair a pending malformed
    /// block any more, so drop it and surface whatever follows.
    pub fn settle(&mut self) -> Vec<ToolCall> {
        self.drain_blocks(true)
    }

    /// Overwrite from character offset `index`, growing the buffer as needed.
    fn splice(&mut self, index: usize, edit: &str) -> Result<(), ProxyError> {
        let char_len = self.buffer.chars().count();
        if index > char_len {
            return Err(ProxyError::ToolAccumulation {
                message: format!("edit index {index} beyond buffer of {char_len} chars"),
            });
        }
        let start = byte_offset(&self.buffer, index);
        let end = byte_offset(&self.buffer, index + edit.chars().count());
        self.buffer.replace_range(start..end, edit);
        Ok(())
    }

    fn drain_blocks(&mut self, settling: bool) -> Vec<ToolCall> {
        let mut completed = Vec::new();
        let mut cursor = 0;
        let mut ordinal = 0;

        while let Some((body, next)) = next_block(&self.buffer, cursor) {
            cursor = next;
            ordinal += 1;
            if ordinal <= self.blocks_consumed {
                continue;
            }
            match parse_block(body) {
                Ok((id, name, arguments)) => {
                    self.blocks_consumed = ordinal;
                    if !self.client_tools.iter().any(|t| *t == name) {
                        tracing::debug!("Skipping upstream capability block: {}", name);
                        continue;
                    }
                    let call = ToolCall { index: self.calls.len() as u32, id, name, arguments };
                    tracing::debug!("Tool call #{} complete: {}", call.index, call.name);
                    self.calls.push(call.clone());
                    completed.push(call);
                },
                Err(e) if settling || next_block(&self.buffer, cursor).is_some() => {
                    tracing::warn!("Dropping tool block #{}: {}", ordinal, e);
                    self.blocks_consumed = ordinal;
                },
                Err(e) => {
                    // A later edit may still repair it
                    tracing::debug!("Tool block #{} not parseable yet: {}", ordinal, e);
                    break;
                },
            }
        }
        completed
    }
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

/// Body of the next complete block at or after `from`, and the offset past it.
fn next_block(buffer: &str, from: usize) -> Option<(&str, usize)> {
    let open = from + buffer[from..].find(BLOCK_OPEN)?;
    let body_start = open + buffer[open..].find('>')? + 1;
    let close = body_start + buffer[body_start..].find(BLOCK_CLOSE)?;
    Some((&buffer[body_start..close], close + BLOCK_CLOSE.len()))
}

fn parse_block(body: &str) -> Result<(String, String, String), ProxyError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| ProxyError::ToolAccumulation { message: format!("invalid block JSON: {e}") })?;
    let meta = value
        .pointer("/data/metadata")
        .or_else(|| value.get("metadata"))
        .unwrap_or(&value);

    let name = meta
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProxyError::ToolAccumulation { message: "block has no tool name".into() })?
        .to_string();
    let id = meta
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("call_{}", Uuid::new_v4().simple()), str::to_string);
    let arguments = match meta.get("arguments") {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    };
    Ok((id, name, arguments))
}
