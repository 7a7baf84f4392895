// ABOUTME: Database operations for chat conversations and messages
// ABOUTME: CRUD with per-user isolation and chronological message ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// User ID who owns the conversation
    pub user_id: String,
    /// When the conversation was created (ISO 8601)
    pub created_at: String,
    /// When the conversation was last updated (ISO 8601)
    pub updated_at: String,
}

/// Database representation of a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Conversation ID this message belongs to
    pub conversation_id: String,
    /// Role of the message sender (user or assistant)
    pub role: String,
    /// Message content
    pub content: String,
    /// Tool calls serialized as JSON text, for assistant messages
    pub tool_calls: Option<String>,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Conversation and message database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Create a new conversation for the user
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create_conversation(&self, user_id: &str) -> AppResult<ConversationRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO conversations (id, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(ConversationRecord {
            id,
            user_id: user_id.to_owned(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a conversation by ID with ownership check
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        Ok(row.map(|r| Self::row_to_conversation(&r)))
    }

    /// List the user's conversations, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_conversations(
        &self,
        user_id: &str,
        limit: i64,
    ) -> AppResult<Vec<ConversationRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        Ok(rows.iter().map(Self::row_to_conversation).collect())
    }

    /// Get the user's most recently updated conversation, if any
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn most_recent_conversation(
        &self,
        user_id: &str,
    ) -> AppResult<Option<ConversationRecord>> {
        let mut conversations = self.list_conversations(user_id, 1).await?;
        Ok(conversations.pop())
    }

    /// Bump the conversation's updated_at to now
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn touch_conversation(&self, conversation_id: &str) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            UPDATE conversations SET updated_at = $1 WHERE id = $2
            ",
        )
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append a message to a conversation
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn add_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        tool_calls: Option<&str>,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, tool_calls, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(tool_calls)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            role: role.to_owned(),
            content: content.to_owned(),
            tool_calls: tool_calls.map(ToOwned::to_owned),
            created_at: now,
        })
    }

    /// Get the last `limit` messages of a conversation in chronological order.
    ///
    /// Insertion order breaks ties between messages created in the same
    /// timestamp tick.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, tool_calls, created_at
            FROM (
                SELECT rowid, id, conversation_id, role, content, tool_calls, created_at
                FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, rowid DESC
                LIMIT $2
            )
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        Ok(rows.iter().map(Self::row_to_message).collect())
    }

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> ConversationRecord {
        ConversationRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> MessageRecord {
        MessageRecord {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            role: row.get("role"),
            content: row.get("content"),
            tool_calls: row.get("tool_calls"),
            created_at: row.get("created_at"),
        }
    }
}
