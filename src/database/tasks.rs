// ABOUTME: Database operations for user tasks
// ABOUTME: CRUD with per-user isolation; every query filters by user_id
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Filter applied when listing tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatusFilter {
    /// All tasks regardless of completion
    All,
    /// Only incomplete tasks
    Pending,
    /// Only completed tasks
    Completed,
}

impl TaskStatusFilter {
    /// Parse the filter value used by the list tool; unknown values mean all
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }
}

/// Database representation of a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task ID
    pub id: String,
    /// User ID who owns the task
    pub user_id: String,
    /// Task title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Whether the task is done
    pub completed: bool,
    /// When the task was created (ISO 8601)
    pub created_at: String,
    /// When the task was last updated (ISO 8601)
    pub updated_at: String,
}

/// Task database operations manager
pub struct TaskManager {
    pool: SqlitePool,
}

impl TaskManager {
    /// Create a new task manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a task for the user
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> AppResult<TaskRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO tasks (id, user_id, title, description, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $5)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create task: {e}")))?;

        Ok(TaskRecord {
            id,
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            description: description.map(ToOwned::to_owned),
            completed: false,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a task by ID with ownership check
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_task(&self, task_id: &str, user_id: &str) -> AppResult<Option<TaskRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, description, completed, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get task: {e}")))?;

        Ok(row.map(|r| Self::row_to_record(&r)))
    }

    /// List the user's tasks, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_tasks(
        &self,
        user_id: &str,
        filter: TaskStatusFilter,
    ) -> AppResult<Vec<TaskRecord>> {
        let query = match filter {
            TaskStatusFilter::All => {
                r"
                SELECT id, user_id, title, description, completed, created_at, updated_at
                FROM tasks
                WHERE user_id = $1
                ORDER BY created_at ASC, rowid ASC
                "
            }
            TaskStatusFilter::Pending => {
                r"
                SELECT id, user_id, title, description, completed, created_at, updated_at
                FROM tasks
                WHERE user_id = $1 AND completed = 0
                ORDER BY created_at ASC, rowid ASC
                "
            }
            TaskStatusFilter::Completed => {
                r"
                SELECT id, user_id, title, description, completed, created_at, updated_at
                FROM tasks
                WHERE user_id = $1 AND completed = 1
                ORDER BY created_at ASC, rowid ASC
                "
            }
        };

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list tasks: {e}")))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    /// Set a task's completion flag
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn set_completed(
        &self,
        task_id: &str,
        user_id: &str,
        completed: bool,
    ) -> AppResult<Option<TaskRecord>> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE tasks SET completed = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4
            ",
        )
        .bind(i64::from(completed))
        .bind(&now)
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update task: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_task(task_id, user_id).await
    }

    /// Update a task's title and/or description
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_task(
        &self,
        task_id: &str,
        user_id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<TaskRecord>> {
        let Some(existing) = self.get_task(task_id, user_id).await? else {
            return Ok(None);
        };

        let new_title = title.unwrap_or(&existing.title);
        let new_description = description.or(existing.description.as_deref());
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            UPDATE tasks SET title = $1, description = $2, updated_at = $3
            WHERE id = $4 AND user_id = $5
            ",
        )
        .bind(new_title)
        .bind(new_description)
        .bind(&now)
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update task: {e}")))?;

        self.get_task(task_id, user_id).await
    }

    /// Delete a task; returns true when a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_task(&self, task_id: &str, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM tasks WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete task: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> TaskRecord {
        TaskRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
            completed: row.get::<i64, _>("completed") != 0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
