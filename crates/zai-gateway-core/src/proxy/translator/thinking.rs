//! Thinking-block markup handling.
//!
//! The upstream wraps reasoning in `<details ...><summary>...</summary>\n> ...`
//! and closes it with `</details>\n` inside the first answer-phase edit.

use zai_gateway_types::ThinkingMode;

pub const THINKING_OPEN: &str = "<details";
pub const SUMMARY_CLOSE: &str = "</summary>\n>";
pub const THINKING_CLOSE: &str = "</details>\n";

/// Reasoning text of a thinking-phase delta. Only a delta that opens the
/// block carries the wrapper; everything after the summary line is kept,
/// including later `> ` quoted lines. Anything else is returned unchanged.
pub fn thinking_text(delta: &str, mode: ThinkingMode) -> &str {
    if mode == ThinkingMode::Raw || !delta.starts_with(THINKING_OPEN) {
        return delta;
    }
    match delta.rfind(SUMMARY_CLOSE) {
        Some(pos) => delta[pos + SUMMARY_CLOSE.len()..].trim(),
        None => delta,
    }
}

/// For an answer-phase edit that closes the thinking block, the answer text
/// that follows the closing marker. `None` when the edit does not close it.
pub fn answer_after_close(edit: &str) -> Option<&str> {
    edit.rfind(THINKING_CLOSE).map(|pos| &edit[pos + THINKING_CLOSE.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENING: &str = "<details type=\"reasoning\" done=\"false\">\n<summary>Thinking…</summary>\n> Let me";

    #[test]
    fn test_opening_delta_strips_wrapper() {
        assert_eq!(thinking_text(OPENING, ThinkingMode::Think), "Let me");
        assert_eq!(thinking_text(OPENING, ThinkingMode::Strip), "Let me");
    }

    #[test]
    fn test_multi_line_opening_keeps_every_line() {
        let delta = "<details type=\"reasoning\" done=\"false\">\n<summary>Thinking…</summary>\n> First line of reasoning\n> second line";
        assert_eq!(thinking_text(delta, ThinkingMode::Think), "First line of reasoning\n> second line");
    }

    #[test]
    fn test_opening_without_summary_marker_is_verbatim() {
        let delta = "<details type=\"reasoning\">";
        assert_eq!(thinking_text(delta, ThinkingMode::Think), delta);
    }

    #[test]
    fn test_raw_mode_keeps_wrapper() {
        assert_eq!(thinking_text(OPENING, ThinkingMode::Raw), OPENING);
    }

    #[test]
    fn test_follow_up_delta_unchanged() {
        assert_eq!(thinking_text(" think about it", ThinkingMode::Think), " think about it");
    }

    #[test]
    fn test_answer_after_close() {
        assert_eq!(answer_after_close("> step\n</details>\nHello"), Some("Hello"));
        assert_eq!(answer_after_close("</details>\n"), Some(""));
        assert_eq!(answer_after_close("a</details>\nb</details>\nc"), Some("c"));
        assert_eq!(answer_after_close("Hello"), None);
    }
}
