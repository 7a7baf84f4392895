// ABOUTME: Conversation resolution and turn persistence around an agent run
// ABOUTME: Unknown conversation ids fall back to a fresh conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Chat Orchestration
//!
//! Glue between the HTTP layer and the agent: resolve or create the
//! conversation, load the history window, and apply the persistence policy
//! after the agent has run. The user message is always persisted; the
//! assistant reply only when the turn actually succeeded.

use serde_json::json;
use tracing::warn;

use crate::constants::{is_error_sentinel, HISTORY_LOAD_LIMIT};
use crate::database::{ConversationRecord, Database, MessageRecord};
use crate::errors::AppResult;
use crate::tools::ToolCallRecord;

/// Coordinates conversation state for chat turns
pub struct ChatOrchestrationService {
    database: Database,
}

impl ChatOrchestrationService {
    /// Create a new orchestration service
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Resolve the conversation for a chat turn.
    ///
    /// A missing id creates a new conversation. An unknown or foreign id
    /// also creates a new one rather than failing the request.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn resolve_conversation(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
    ) -> AppResult<ConversationRecord> {
        let chat = self.database.chat();

        if let Some(id) = conversation_id {
            if let Some(conversation) = chat.get_conversation(id, user_id).await? {
                return Ok(conversation);
            }
            warn!(conversation_id = id, "Conversation not found, creating new one");
        }

        chat.create_conversation(user_id).await
    }

    /// Load the raw history window for an agent run, chronological
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn load_history(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        self.database
            .chat()
            .recent_messages(conversation_id, HISTORY_LOAD_LIMIT)
            .await
    }

    /// Persist the turn after the agent has run.
    ///
    /// The user message is always written. The assistant reply is written
    /// only when it is non-empty and not an error sentinel; executed tool
    /// calls are serialized into its `tool_calls` column. The conversation
    /// timestamp is bumped either way.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn persist_turn(
        &self,
        conversation_id: &str,
        user_message: &str,
        assistant_response: &str,
        tool_calls: &[ToolCallRecord],
    ) -> AppResult<()> {
        let chat = self.database.chat();

        chat.add_message(conversation_id, "user", user_message, None)
            .await?;

        if assistant_response.is_empty() || is_error_sentinel(assistant_response) {
            warn!(conversation_id, "Not saving failed assistant response");
        } else {
            let tool_calls_json = if tool_calls.is_empty() {
                None
            } else {
                Some(json!({"calls": tool_calls}).to_string())
            };
            chat.add_message(
                conversation_id,
                "assistant",
                assistant_response,
                tool_calls_json.as_deref(),
            )
            .await?;
        }

        chat.touch_conversation(conversation_id).await
    }
}
