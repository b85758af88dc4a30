//! Incremental SSE line splitting.

use bytes::BytesMut;

/// Holds at most one partial line between reads.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: BytesMut,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete line without its terminator. Invalid UTF-8 is replaced
    /// rather than dropped so a split multi-byte character never loses a line.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let raw = self.buffer.split_to(pos + 1);
        let line = &raw[..pos];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(String::from_utf8_lossy(line).into_owned())
    }

    /// Unterminated trailing bytes, consumed at end of input.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = self.buffer.split();
        Some(String::from_utf8_lossy(&raw).into_owned())
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Payload of a `data:` line, if it is one.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
