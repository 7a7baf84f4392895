// ABOUTME: Implementations of the six task tools exposed to the agent
// ABOUTME: Title-based lookup, status filtering, and structured JSON results
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{optional_str, ToolContext};
use crate::database::tasks::TaskStatusFilter;
use crate::database::TaskRecord;
use serde_json::{json, Value};
use tracing::error;

/// Outcome of resolving a task reference to an id
enum TitleLookup {
    /// Exactly one task matched
    Found(String),
    /// Structured error to hand back to the model
    Failed(Value),
}

/// Resolve a title search to a single task id.
///
/// Case-insensitive substring match over the user's task titles. Zero or
/// multiple matches produce the structured errors the model is expected to
/// relay to the user.
async fn find_task_by_title(ctx: &ToolContext, search: &str) -> TitleLookup {
    let tasks = match ctx
        .task_manager
        .list_tasks(&ctx.user_id, TaskStatusFilter::All)
        .await
    {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Error searching tasks by title: {e}");
            return TitleLookup::Failed(json!({
                "success": false,
                "error": "Failed to list tasks. Please try again.",
            }));
        }
    };

    let needle = search.to_lowercase();
    let matches: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [] => TitleLookup::Failed(json!({
            "success": false,
            "error": format!("No task found matching '{search}'"),
        })),
        [only] => TitleLookup::Found(only.id.clone()),
        many => {
            let titles: Vec<&str> = many.iter().map(|t| t.title.as_str()).collect();
            TitleLookup::Failed(json!({
                "success": false,
                "error": format!(
                    "Multiple tasks match '{search}': {titles:?}. Please be more specific."
                ),
            }))
        }
    }
}

/// Create a new task
pub async fn add_task(args: &Value, ctx: &ToolContext) -> Value {
    let Some(title) = optional_str(args, "title") else {
        return json!({"success": false, "error": "title is required"});
    };
    let description = optional_str(args, "description");

    match ctx
        .task_manager
        .create_task(&ctx.user_id, title, description)
        .await
    {
        Ok(task) => json!({
            "success": true,
            "task": {
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "completed": task.completed,
                "created_at": task.created_at,
            }
        }),
        Err(e) => {
            error!("Error creating task: {e}");
            json!({"success": false, "error": "Failed to create task. Please try again."})
        }
    }
}

/// List tasks filtered by status
pub async fn list_tasks(args: &Value, ctx: &ToolContext) -> Value {
    let status = optional_str(args, "status").unwrap_or("all");
    let filter = TaskStatusFilter::parse(status);

    match ctx.task_manager.list_tasks(&ctx.user_id, filter).await {
        Ok(tasks) => {
            let task_list: Vec<Value> = tasks
                .iter()
                .map(|task| {
                    json!({
                        "id": task.id,
                        "title": task.title,
                        "description": task.description,
                        "completed": task.completed,
                        "created_at": task.created_at,
                    })
                })
                .collect();
            json!({
                "success": true,
                "count": task_list.len(),
                "tasks": task_list,
            })
        }
        Err(e) => {
            error!("Error listing tasks: {e}");
            json!({"success": false, "error": "Failed to list tasks. Please try again."})
        }
    }
}

/// Mark a task complete or incomplete, by id or title
pub async fn complete_task(args: &Value, ctx: &ToolContext) -> Value {
    let completed = args.get("completed").and_then(Value::as_bool).unwrap_or(true);

    let task_id = match resolve_task_id(args, ctx, "title").await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return json!({"success": false, "error": "Either task_id or title is required"})
        }
        Err(failure) => return failure,
    };

    match ctx
        .task_manager
        .set_completed(&task_id, &ctx.user_id, completed)
        .await
    {
        Ok(Some(task)) => json!({
            "success": true,
            "task": {
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "completed": task.completed,
                "updated_at": task.updated_at,
            }
        }),
        Ok(None) => json!({"success": false, "error": "Task not found"}),
        Err(e) => {
            error!("Error completing task: {e}");
            json!({
                "success": false,
                "error": "Failed to update task completion. Please try again.",
            })
        }
    }
}

/// Delete a task, by id or title
pub async fn delete_task(args: &Value, ctx: &ToolContext) -> Value {
    let task_id = match resolve_task_id(args, ctx, "title").await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return json!({"success": false, "error": "Either task_id or title is required"})
        }
        Err(failure) => return failure,
    };

    match ctx.task_manager.delete_task(&task_id, &ctx.user_id).await {
        Ok(true) => json!({"success": true, "deleted_task_id": task_id}),
        Ok(false) => json!({"success": false, "error": "Task not found"}),
        Err(e) => {
            error!("Error deleting task: {e}");
            json!({"success": false, "error": "Failed to delete task. Please try again."})
        }
    }
}

/// Update a task's title and/or description, by id or search title
pub async fn update_task(args: &Value, ctx: &ToolContext) -> Value {
    let task_id = match resolve_task_id(args, ctx, "search_title").await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return json!({
                "success": false,
                "error": "Either task_id or search_title is required",
            })
        }
        Err(failure) => return failure,
    };

    let new_title = optional_str(args, "title");
    let new_description = optional_str(args, "description");

    if new_title.is_none() && new_description.is_none() {
        return json!({
            "success": false,
            "error": "At least one of title or description is required to update",
        });
    }

    match ctx
        .task_manager
        .update_task(&task_id, &ctx.user_id, new_title, new_description)
        .await
    {
        Ok(Some(task)) => json!({
            "success": true,
            "task": {
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "completed": task.completed,
                "updated_at": task.updated_at,
            }
        }),
        Ok(None) => json!({"success": false, "error": "Task not found"}),
        Err(e) => {
            error!("Error updating task: {e}");
            json!({"success": false, "error": "Failed to update task. Please try again."})
        }
    }
}

/// Report the authenticated user's identity
#[must_use]
pub fn get_current_user(args: &Value, ctx: &ToolContext) -> Value {
    let include_details = args
        .get("include_details")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let mut user_info = json!({"user_id": ctx.user_id});
    if include_details {
        user_info["name"] = json!(ctx.name.as_deref().unwrap_or("Unknown"));
        user_info["email"] = json!(ctx.email.as_deref().unwrap_or("unknown"));
    }

    json!({"success": true, "user": user_info})
}

/// Resolve a task reference from args: a direct `task_id` wins, otherwise a
/// title search under `title_key`. `Ok(None)` means neither was supplied.
async fn resolve_task_id(
    args: &Value,
    ctx: &ToolContext,
    title_key: &str,
) -> Result<Option<String>, Value> {
    if let Some(id) = optional_str(args, "task_id") {
        return Ok(Some(id.to_owned()));
    }

    match optional_str(args, title_key) {
        Some(search) => match find_task_by_title(ctx, search).await {
            TitleLookup::Found(id) => Ok(Some(id)),
            TitleLookup::Failed(failure) => Err(failure),
        },
        None => Ok(None),
    }
}
