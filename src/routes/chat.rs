// ABOUTME: Chat route handlers for the conversational task assistant
// ABOUTME: REST endpoints for sending messages and browsing conversation transcripts
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat routes.
//!
//! All handlers require JWT authentication, and the token subject must match
//! the `{user_id}` path segment. A failed agent run still returns 200 with
//! the fixed apology text; only a missing provider configuration surfaces as
//! a 500.

use crate::{
    constants::{
        AGENT_APOLOGY, CONVERSATIONS_DEFAULT_LIMIT, MESSAGES_PAGE_LIMIT, MESSAGE_MAX_CHARS,
        MESSAGE_MIN_CHARS, SERVICE_NOT_CONFIGURED,
    },
    errors::{AppError, ErrorCode},
    resources::ServerResources,
    services::{agent::AgentService, ChatOrchestrationService},
    tools::{ToolCallRecord, ToolContext},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for sending a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    /// The user's natural-language message
    pub message: String,
    /// Conversation to continue; omitted to start a new one
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response for a chat turn
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Conversation the turn was recorded in
    pub conversation_id: String,
    /// Assistant reply text
    pub response: String,
    /// Tool calls executed during the turn, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
}

/// A conversation in listing responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationView {
    /// Conversation ID
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Response for listing conversations
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    /// Conversations, most recently updated first
    pub conversations: Vec<ConversationView>,
}

/// A transcript message in listing responses
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageView {
    /// Message ID
    pub id: String,
    /// Role (user or assistant)
    pub role: String,
    /// Message content
    pub content: String,
    /// Creation timestamp
    pub timestamp: String,
    /// Tool calls attached to the message, camelCase for the frontend
    #[serde(rename = "toolCalls")]
    pub tool_calls: Option<Value>,
}

/// Response for listing a conversation's messages
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesListResponse {
    /// Messages in chronological order
    pub messages: Vec<MessageView>,
}

/// Query parameters for listing conversations
#[derive(Debug, Deserialize, Default)]
pub struct ListConversationsQuery {
    /// Maximum number of conversations to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    CONVERSATIONS_DEFAULT_LIMIT
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/:user_id/chat", post(Self::chat))
            .route("/:user_id/conversations", get(Self::list_conversations))
            .route(
                "/:user_id/conversations/recent",
                get(Self::recent_conversation),
            )
            .route(
                "/:user_id/conversations/:conversation_id/messages",
                get(Self::conversation_messages),
            )
            .with_state(resources)
    }

    /// Authenticate the request and enforce the user-scoped path.
    ///
    /// The token subject must equal the `{user_id}` path segment; a mismatch
    /// is a 403 before any other work happens.
    fn authenticate(
        headers: &HeaderMap,
        resources: &ServerResources,
        path_user_id: &str,
    ) -> Result<crate::auth::AuthenticatedUser, AppError> {
        let header_value = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        let token = crate::auth::extract_bearer_token(header_value)?;
        let user = resources.auth_manager.validate_token(token)?;

        if user.user_id != path_user_id {
            return Err(AppError::permission_denied("User ID mismatch"));
        }

        Ok(user)
    }

    /// POST /{`user_id`}/chat - run one agent turn
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<ChatRequestBody>,
    ) -> Result<Json<ChatResponse>, AppError> {
        let user = Self::authenticate(&headers, &resources, &user_id)?;

        let message_chars = body.message.chars().count();
        if !(MESSAGE_MIN_CHARS..=MESSAGE_MAX_CHARS).contains(&message_chars) {
            return Err(AppError::invalid_input(format!(
                "message must be between {MESSAGE_MIN_CHARS} and {MESSAGE_MAX_CHARS} characters"
            )));
        }

        let orchestration = ChatOrchestrationService::new(resources.database.clone());
        let conversation = orchestration
            .resolve_conversation(&user.user_id, body.conversation_id.as_deref())
            .await?;
        let history = orchestration.load_history(&conversation.id).await?;

        let ctx = ToolContext {
            task_manager: resources.database.tasks(),
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        };

        info!(user_id = %user.user_id, conversation_id = %conversation.id, "Running agent");

        let agent = AgentService::new(Arc::clone(&resources.providers));
        let (response_text, tool_calls) = match agent.run(&ctx, &body.message, &history).await {
            Ok(outcome) => (outcome.response, outcome.tool_calls),
            Err(e) if e.code == ErrorCode::ConfigError => {
                error!("Agent initialization failed: {e}");
                return Err(AppError::new(ErrorCode::ConfigError, SERVICE_NOT_CONFIGURED));
            }
            Err(e) => {
                error!("Agent execution failed: {e}");
                (AGENT_APOLOGY.to_owned(), Vec::new())
            }
        };

        orchestration
            .persist_turn(&conversation.id, &body.message, &response_text, &tool_calls)
            .await?;

        Ok(Json(ChatResponse {
            conversation_id: conversation.id,
            response: response_text,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
        }))
    }

    /// GET /{`user_id`}/conversations - list conversations, newest first
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        Query(query): Query<ListConversationsQuery>,
        headers: HeaderMap,
    ) -> Result<Json<ConversationListResponse>, AppError> {
        let user = Self::authenticate(&headers, &resources, &user_id)?;

        let conversations = resources
            .database
            .chat()
            .list_conversations(&user.user_id, query.limit)
            .await?;

        Ok(Json(ConversationListResponse {
            conversations: conversations
                .into_iter()
                .map(|c| ConversationView {
                    id: c.id,
                    user_id: c.user_id,
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                })
                .collect(),
        }))
    }

    /// GET /{`user_id`}/conversations/recent - most recent conversation or 204
    async fn recent_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources, &user_id)?;

        let recent = resources
            .database
            .chat()
            .most_recent_conversation(&user.user_id)
            .await?;

        match recent {
            Some(c) => Ok(Json(ConversationView {
                id: c.id,
                user_id: c.user_id,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .into_response()),
            None => Ok(StatusCode::NO_CONTENT.into_response()),
        }
    }

    /// GET /{`user_id`}/conversations/{`conversation_id`}/messages
    async fn conversation_messages(
        State(resources): State<Arc<ServerResources>>,
        Path((user_id, conversation_id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<MessagesListResponse>, AppError> {
        let user = Self::authenticate(&headers, &resources, &user_id)?;

        if uuid::Uuid::parse_str(&conversation_id).is_err() {
            return Err(AppError::invalid_input("Invalid conversation ID format"));
        }

        let chat = resources.database.chat();
        let conversation = chat
            .get_conversation(&conversation_id, &user.user_id)
            .await?;
        if conversation.is_none() {
            return Err(AppError::new(
                ErrorCode::ResourceNotFound,
                "Conversation not found or access denied",
            ));
        }

        let messages = chat
            .recent_messages(&conversation_id, MESSAGES_PAGE_LIMIT)
            .await?;

        Ok(Json(MessagesListResponse {
            messages: messages
                .into_iter()
                .map(|m| MessageView {
                    id: m.id,
                    role: m.role,
                    content: m.content,
                    timestamp: m.created_at,
                    tool_calls: m
                        .tool_calls
                        .as_deref()
                        .and_then(|raw| serde_json::from_str(raw).ok()),
                })
                .collect(),
        }))
    }
}
