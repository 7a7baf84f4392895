// ABOUTME: Tool layer exposing task operations to the LLM agent
// ABOUTME: Declarations, explicit per-run context, and name-based dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Agent Tools
//!
//! Six tools the agent can call: `add_task`, `list_tasks`, `complete_task`,
//! `delete_task`, `update_task`, and `get_current_user`. Each dispatch runs
//! against an explicit [`ToolContext`] built for the current request; there
//! is no ambient state.
//!
//! Dispatch never fails: database errors and bad arguments come back as
//! `{"success": false, "error": ...}` JSON values the model can read.

pub mod tasks;

use crate::database::TaskManager;
use crate::llm::{FunctionDeclaration, Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Per-run context threaded through every tool dispatch
pub struct ToolContext {
    /// Task database operations
    pub task_manager: TaskManager,
    /// Authenticated user id; scopes every query
    pub user_id: String,
    /// Email from the token, if present
    pub email: Option<String>,
    /// Display name from the token, if present
    pub name: Option<String>,
}

/// One executed tool call, recorded by the agent loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name
    pub tool: String,
    /// Arguments the model supplied
    pub params: Value,
    /// JSON result returned to the model
    pub result: Value,
}

/// Execute a tool by name, returning its JSON result.
///
/// Unknown names produce a structured error rather than failing the run.
pub async fn dispatch(name: &str, args: &Value, ctx: &ToolContext) -> Value {
    match name {
        "add_task" => tasks::add_task(args, ctx).await,
        "list_tasks" => tasks::list_tasks(args, ctx).await,
        "complete_task" => tasks::complete_task(args, ctx).await,
        "delete_task" => tasks::delete_task(args, ctx).await,
        "update_task" => tasks::update_task(args, ctx).await,
        "get_current_user" => tasks::get_current_user(args, ctx),
        other => json!({
            "success": false,
            "error": format!("Unknown tool: {other}"),
        }),
    }
}

/// Declarations for all six task tools, in one `Tool` group
#[must_use]
pub fn task_tool_declarations() -> Vec<Tool> {
    vec![Tool {
        function_declarations: vec![
            FunctionDeclaration {
                name: "add_task".to_owned(),
                description: "Create a new task.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "Task title"
                        },
                        "description": {
                            "type": "string",
                            "description": "Optional longer description"
                        }
                    },
                    "required": ["title"]
                })),
            },
            FunctionDeclaration {
                name: "list_tasks".to_owned(),
                description: "List tasks. status: all, pending, or completed.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "status": {
                            "type": "string",
                            "enum": ["all", "pending", "completed"],
                            "description": "Which tasks to list"
                        }
                    }
                })),
            },
            FunctionDeclaration {
                name: "complete_task".to_owned(),
                description: "Mark task as complete or incomplete by ID or title.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "task_id": {
                            "type": "string",
                            "description": "Task ID, when known"
                        },
                        "title": {
                            "type": "string",
                            "description": "Title to search for when the ID is unknown"
                        },
                        "completed": {
                            "type": "boolean",
                            "description": "Completion state to set, default true"
                        }
                    }
                })),
            },
            FunctionDeclaration {
                name: "delete_task".to_owned(),
                description: "Delete a task by ID or title.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "task_id": {
                            "type": "string",
                            "description": "Task ID, when known"
                        },
                        "title": {
                            "type": "string",
                            "description": "Title to search for when the ID is unknown"
                        }
                    }
                })),
            },
            FunctionDeclaration {
                name: "update_task".to_owned(),
                description: "Update a task's title or description by ID or search_title."
                    .to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "task_id": {
                            "type": "string",
                            "description": "Task ID, when known"
                        },
                        "search_title": {
                            "type": "string",
                            "description": "Title to search for when the ID is unknown"
                        },
                        "title": {
                            "type": "string",
                            "description": "New title"
                        },
                        "description": {
                            "type": "string",
                            "description": "New description"
                        }
                    }
                })),
            },
            FunctionDeclaration {
                name: "get_current_user".to_owned(),
                description: "Get current user's name and email.".to_owned(),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "include_details": {
                            "type": "boolean",
                            "description": "Include name and email, default true"
                        }
                    }
                })),
            },
        ],
    }]
}

/// Read a string argument, treating empty strings as absent
#[must_use]
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
