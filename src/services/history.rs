// ABOUTME: Shapes persisted transcript messages into prompt history for the agent
// ABOUTME: Filters failed-turn sentinels and keeps only adjacent user/assistant pairs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History formatting.
//!
//! The agent is stateless between turns; prompt context is rebuilt from the
//! transcript on every request. Failed turns (error sentinels) and orphan
//! messages are dropped so the model only sees clean exchanges.

use crate::constants::{is_error_sentinel, HISTORY_MAX_PAIRS};
use crate::database::MessageRecord;
use crate::llm::ChatMessage;

/// Build prompt history from persisted messages, oldest first.
///
/// Keeps only adjacent user→assistant pairs: an assistant sentinel breaks its
/// pair, orphan user messages and standalone assistant messages are skipped.
/// At most the last [`HISTORY_MAX_PAIRS`] pairs survive.
#[must_use]
pub fn format_history(messages: &[MessageRecord]) -> Vec<ChatMessage> {
    let mut formatted = Vec::new();
    let mut i = 0;

    while i < messages.len() {
        let msg = &messages[i];

        if msg.role == "assistant" && is_error_sentinel(&msg.content) {
            i += 1;
            continue;
        }

        if msg.role == "user" {
            let next = messages.get(i + 1);
            if let Some(reply) = next {
                if reply.role == "assistant" && !is_error_sentinel(&reply.content) {
                    formatted.push(ChatMessage::user(msg.content.clone()));
                    formatted.push(ChatMessage::assistant(reply.content.clone()));
                    i += 2;
                    continue;
                }
            }
            // Orphan user message
            i += 1;
        } else {
            // Standalone assistant message
            i += 1;
        }
    }

    let keep = HISTORY_MAX_PAIRS * 2;
    if formatted.len() > keep {
        formatted.split_off(formatted.len() - keep)
    } else {
        formatted
    }
}

/// Marker prepended to the current message when history is present, so the
/// model does not answer an earlier turn again.
pub const CURRENT_MESSAGE_MARKER: &str = "[CURRENT USER MESSAGE - RESPOND TO THIS]\n";

/// Wrap the current user message for prompt assembly.
///
/// With history the message gets the current-message marker; without history
/// it is passed through unchanged.
#[must_use]
pub fn frame_current_message(user_message: &str, has_history: bool) -> String {
    if has_history {
        format!("{CURRENT_MESSAGE_MARKER}{user_message}")
    } else {
        user_message.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AGENT_APOLOGY;

    fn msg(role: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: format!("id-{role}-{}", content.len()),
            conversation_id: "conv".to_owned(),
            role: role.to_owned(),
            content: content.to_owned(),
            tool_calls: None,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[test]
    fn test_pairs_survive() {
        let messages = vec![
            msg("user", "add milk"),
            msg("assistant", "Added milk."),
            msg("user", "list tasks"),
            msg("assistant", "1. milk"),
        ];
        let history = format_history(&messages);
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "add milk");
        assert_eq!(history[3].content, "1. milk");
    }

    #[test]
    fn test_sentinel_breaks_pair() {
        let messages = vec![
            msg("user", "add milk"),
            msg("assistant", AGENT_APOLOGY),
            msg("user", "list"),
            msg("assistant", "1. milk"),
        ];
        let history = format_history(&messages);
        // The first user message becomes an orphan once its reply is filtered
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "list");
    }

    #[test]
    fn test_orphan_user_message_dropped() {
        let messages = vec![msg("user", "hello?")];
        assert!(format_history(&messages).is_empty());
    }

    #[test]
    fn test_standalone_assistant_dropped() {
        let messages = vec![msg("assistant", "greetings"), msg("user", "hi"), msg("assistant", "hello")];
        let history = format_history(&messages);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hi");
    }

    #[test]
    fn test_last_three_pairs_kept() {
        let mut messages = Vec::new();
        for i in 0..5 {
            messages.push(msg("user", &format!("question {i}")));
            messages.push(msg("assistant", &format!("answer {i}")));
        }
        let history = format_history(&messages);
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content, "question 2");
        assert_eq!(history[5].content, "answer 4");
    }

    #[test]
    fn test_frame_current_message() {
        assert_eq!(frame_current_message("hi", false), "hi");
        let framed = frame_current_message("hi", true);
        assert!(framed.starts_with(CURRENT_MESSAGE_MARKER));
        assert!(framed.ends_with("hi"));
    }
}
