// ABOUTME: Application-wide constants for limits and fixed user-facing strings
// ABOUTME: Error sentinels here drive both history filtering and turn persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Fixed apology returned when the agent fails for a non-recoverable reason.
/// Never persisted to the transcript.
pub const AGENT_APOLOGY: &str = "I'm having trouble thinking right now. Please try again.";

/// Message returned when no LLM provider credential is configured.
pub const SERVICE_NOT_CONFIGURED: &str = "AI service is not configured properly";

/// Assistant-message contents that mark a failed turn. These are filtered out
/// of prompt history and are never written to the message store.
pub const ERROR_SENTINELS: &[&str] = &[
    AGENT_APOLOGY,
    SERVICE_NOT_CONFIGURED,
    "An error occurred while processing your request",
];

/// Returns true when the content is one of the known error sentinels.
#[must_use]
pub fn is_error_sentinel(content: &str) -> bool {
    ERROR_SENTINELS.contains(&content)
}

/// Inclusive bounds on an incoming chat message, in characters.
pub const MESSAGE_MIN_CHARS: usize = 1;
pub const MESSAGE_MAX_CHARS: usize = 2000;

/// How many persisted messages to load as raw history before pair filtering.
pub const HISTORY_LOAD_LIMIT: i64 = 20;

/// Maximum user/assistant pairs kept in the formatted prompt history.
pub const HISTORY_MAX_PAIRS: usize = 3;

/// Maximum messages returned by the conversation messages endpoint.
pub const MESSAGES_PAGE_LIMIT: i64 = 50;

/// Default number of conversations returned by the listing endpoint.
pub const CONVERSATIONS_DEFAULT_LIMIT: i64 = 10;

/// Maximum LLM iterations within one provider attempt before forcing a
/// text response.
pub const MAX_TOOL_ITERATIONS: usize = 10;

/// Attempts per provider when the error matches a tool-format failure.
pub const MAX_TOOL_FORMAT_RETRIES: usize = 3;
