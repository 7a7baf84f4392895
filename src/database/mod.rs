// ABOUTME: Database layer built on sqlx with sqlite, schema bootstrap included
// ABOUTME: Exposes task and chat managers over a shared connection pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database access.
//!
//! A thin wrapper over `sqlx::SqlitePool` that creates the schema on startup.
//! Timestamps are stored as RFC 3339 strings; ids are UUID v4 strings.

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub mod chat;
pub mod tasks;

pub use chat::{ChatManager, ConversationRecord, MessageRecord};
pub use tasks::{TaskManager, TaskRecord};

/// Database handle shared across the server
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and bootstrap the schema.
    ///
    /// In-memory databases are pinned to a single connection so every
    /// manager sees the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or
    /// schema creation fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    /// Access the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Task operations manager
    #[must_use]
    pub fn tasks(&self) -> TaskManager {
        TaskManager::new(self.pool.clone())
    }

    /// Conversation and message operations manager
    #[must_use]
    pub fn chat(&self) -> ChatManager {
        ChatManager::new(self.pool.clone())
    }

    /// Create tables if they do not exist
    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create tasks table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create tasks index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tool_calls TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages index: {e}")))?;

        Ok(())
    }
}
