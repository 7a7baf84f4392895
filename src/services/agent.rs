// ABOUTME: Agent orchestrator running the multi-turn tool loop against LLM providers
// ABOUTME: Provider fallback on transient errors, bounded retry on tool-format errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Agent Orchestration
//!
//! One agent run handles one user message: prompt assembly, the multi-turn
//! tool loop, and error recovery. Two recovery layers wrap the loop:
//!
//! 1. **Tool-format retry** — some backends intermittently emit malformed
//!    tool calls; those runs are retried up to 3 times on the same provider.
//! 2. **Provider fallback** — rate limits, quota exhaustion, and API
//!    compatibility errors move the run to the next provider in the
//!    registry. Any other error propagates immediately.

use std::sync::Arc;

use tracing::{info, warn};

use crate::constants::{MAX_TOOL_FORMAT_RETRIES, MAX_TOOL_ITERATIONS};
use crate::database::MessageRecord;
use crate::errors::{AppError, AppResult};
use crate::llm::{
    assistant_system_prompt, ChatMessage, ChatRequest, LlmProvider, ProviderRegistry,
};
use crate::services::history::{format_history, frame_current_message};
use crate::tools::{dispatch, task_tool_declarations, ToolCallRecord, ToolContext};

/// Error-text fragments that send the run to the next provider
const FALLBACK_MARKERS: &[&str] = &[
    "rate",
    "limit",
    "quota",
    "exceeded",
    "unknown field",
    "strict",
    "apiconnectionerror",
    "cohereexception",
];

/// Error-text fragments that trigger a same-provider retry
const TOOL_FORMAT_MARKERS: &[&str] = &["tool_use_failed", "tool call validation failed"];

/// Result of a successful agent run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Final assistant text; empty when the iteration cap was hit
    pub response: String,
    /// Tool calls executed during the run, in order
    pub tool_calls: Vec<ToolCallRecord>,
    /// Why the run ended (stop, `max_iterations`, ...)
    pub finish_reason: Option<String>,
}

/// True when the error text indicates a provider-transient failure
#[must_use]
pub fn should_fallback(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    FALLBACK_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// True when the error text indicates a malformed tool call from the model
#[must_use]
pub fn is_tool_format_error(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    TOOL_FORMAT_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Runs agent turns against the provider registry
pub struct AgentService {
    registry: Arc<ProviderRegistry>,
}

impl AgentService {
    /// Create a new agent service over the given providers
    #[must_use]
    pub const fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Run one agent turn.
    ///
    /// `conversation_history` is the raw persisted transcript window; it is
    /// shaped into prompt history here so failed turns never reach the model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no provider is registered, the
    /// last provider error when all providers fail with transient errors,
    /// or the original error when a provider fails non-transiently.
    pub async fn run(
        &self,
        ctx: &ToolContext,
        user_message: &str,
        conversation_history: &[MessageRecord],
    ) -> AppResult<AgentOutcome> {
        let history = format_history(conversation_history);

        let mut last_error: Option<AppError> = None;

        for provider in self.registry.providers() {
            if !provider.capabilities().supports_function_calling() {
                warn!(
                    provider = provider.name(),
                    "Skipping provider without function calling"
                );
                continue;
            }

            info!(provider = provider.name(), "Attempting agent run");

            match self
                .run_with_retry(provider.as_ref(), ctx, user_message, &history)
                .await
            {
                Ok(outcome) => {
                    info!(
                        provider = provider.name(),
                        tool_calls = outcome.tool_calls.len(),
                        "Agent run completed"
                    );
                    return Ok(outcome);
                }
                Err(e) if should_fallback(&e.to_string()) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next provider"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Err(AppError::config("No providers available")),
        }
    }

    /// Run the tool loop on one provider, retrying on tool-format errors
    async fn run_with_retry(
        &self,
        provider: &dyn LlmProvider,
        ctx: &ToolContext,
        user_message: &str,
        history: &[ChatMessage],
    ) -> AppResult<AgentOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::run_tool_loop(provider, ctx, user_message, history).await {
                Ok(outcome) => return Ok(outcome),
                Err(e)
                    if is_tool_format_error(&e.to_string())
                        && attempt < MAX_TOOL_FORMAT_RETRIES =>
                {
                    warn!(
                        provider = provider.name(),
                        attempt,
                        max = MAX_TOOL_FORMAT_RETRIES,
                        "Tool format error, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The multi-turn tool loop: complete, dispatch tool calls, feed results
    /// back, repeat until the model answers in text or the cap is hit.
    async fn run_tool_loop(
        provider: &dyn LlmProvider,
        ctx: &ToolContext,
        user_message: &str,
        history: &[ChatMessage],
    ) -> AppResult<AgentOutcome> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(assistant_system_prompt()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(frame_current_message(
            user_message,
            !history.is_empty(),
        )));

        let tools = task_tool_declarations();
        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        for _ in 0..MAX_TOOL_ITERATIONS {
            let request = ChatRequest::new(messages.clone());
            let response = provider
                .complete_with_tools(&request, Some(tools.clone()))
                .await?;

            if response.has_function_calls() {
                if let Some(text) = response.text() {
                    if !text.is_empty() {
                        messages.push(ChatMessage::assistant(text));
                    }
                }

                let calls = response.function_calls.unwrap_or_default();
                for call in calls {
                    let result = dispatch(&call.name, &call.args, ctx).await;
                    messages.push(ChatMessage::user(format!(
                        "[Tool Result for {}]: {}",
                        call.name, result
                    )));
                    tool_calls.push(ToolCallRecord {
                        tool: call.name,
                        params: call.args,
                        result,
                    });
                }
                continue;
            }

            let content = response.content.unwrap_or_default();
            return Ok(AgentOutcome {
                response: content,
                tool_calls,
                finish_reason: response.finish_reason,
            });
        }

        // Iteration cap reached without a final text response
        warn!(provider = provider.name(), "Tool loop hit iteration cap");
        Ok(AgentOutcome {
            response: String::new(),
            tool_calls,
            finish_reason: Some("max_iterations".to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_classification() {
        assert!(should_fallback("Groq: rate limit exceeded: slow down"));
        assert!(should_fallback("Gemini: QUOTA exceeded"));
        assert!(should_fallback("unknown field `tool_choice`"));
        assert!(should_fallback("OpenAI: ApiConnectionError: refused"));
        assert!(should_fallback("CohereException: strict mode"));
        assert!(!should_fallback("model overloaded"));
        assert!(!should_fallback("invalid api key"));
    }

    #[test]
    fn test_tool_format_classification() {
        assert!(is_tool_format_error("Groq: tool_use_failed on call"));
        assert!(is_tool_format_error("Tool call validation FAILED"));
        assert!(!is_tool_format_error("rate limit"));
    }
}
