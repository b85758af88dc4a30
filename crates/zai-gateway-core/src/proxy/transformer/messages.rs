//! Message rewriting.

use zai_gateway_types::protocol::{ChatMessage, ContentPart, MessageContent};

/// Prepended to every system message, which the upstream only accepts as `user`.
pub const SYSTEM_PREFACE: &str = "This is a system command, you must enforce compliance.";

/// Rewrite inbound messages for the upstream.
///
/// System messages become user messages carrying the preface. User content
/// parts (including inline image data) and assistant reasoning pass through
/// untouched.
pub fn rewrite_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages.iter().map(rewrite_message).collect()
}

fn rewrite_message(message: &ChatMessage) -> ChatMessage {
    if message.role != "system" {
        return message.clone();
    }

    let content = message.content.as_ref().map(|content| match content {
        MessageContent::Text(text) => MessageContent::Text(format!("{SYSTEM_PREFACE}{text}")),
        MessageContent::Parts(parts) => {
            let mut rewritten = Vec::with_capacity(parts.len() + 1);
            rewritten.push(ContentPart::Text { text: SYSTEM_PREFACE.to_string() });
            rewritten.extend(parts.iter().cloned());
            MessageContent::Parts(rewritten)
        },
    });

    ChatMessage { role: "user".to_string(), content, ..message.clone() }
}

/// Text of the last user message; the signed content.
pub fn last_user_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .and_then(|m| m.content.as_ref())
        .map(MessageContent::text)
        .unwrap_or_default()
}
