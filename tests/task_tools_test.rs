// ABOUTME: Integration tests for the task tool layer
// ABOUTME: Covers dispatch, title-based lookup, and structured tool errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::test_database;
use serde_json::{json, Value};
use taskchat_server::database::Database;
use taskchat_server::tools::{dispatch, ToolContext};

fn context_for(database: &Database, user_id: &str) -> ToolContext {
    ToolContext {
        task_manager: database.tasks(),
        user_id: user_id.to_owned(),
        email: Some("tools@example.com".to_owned()),
        name: Some("Tool Tester".to_owned()),
    }
}

async fn add(ctx: &ToolContext, title: &str) -> Value {
    dispatch("add_task", &json!({"title": title}), ctx).await
}

#[tokio::test]
async fn test_add_task_result_shape() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch(
        "add_task",
        &json!({"title": "Buy milk", "description": "2 liters"}),
        &ctx,
    )
    .await;

    assert_eq!(result["success"], json!(true));
    assert_eq!(result["task"]["title"], json!("Buy milk"));
    assert_eq!(result["task"]["description"], json!("2 liters"));
    assert_eq!(result["task"]["completed"], json!(false));
    assert!(result["task"]["id"].is_string());
    assert!(result["task"]["created_at"].is_string());
}

#[tokio::test]
async fn test_add_task_empty_description_is_null() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch(
        "add_task",
        &json!({"title": "Bare task", "description": ""}),
        &ctx,
    )
    .await;
    assert_eq!(result["task"]["description"], Value::Null);
}

#[tokio::test]
async fn test_list_tasks_status_filters() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let first = add(&ctx, "First").await;
    add(&ctx, "Second").await;

    let first_id = first["task"]["id"].as_str().unwrap();
    dispatch(
        "complete_task",
        &json!({"task_id": first_id}),
        &ctx,
    )
    .await;

    let all = dispatch("list_tasks", &json!({"status": "all"}), &ctx).await;
    assert_eq!(all["count"], json!(2));

    let pending = dispatch("list_tasks", &json!({"status": "pending"}), &ctx).await;
    assert_eq!(pending["count"], json!(1));
    assert_eq!(pending["tasks"][0]["title"], json!("Second"));

    let completed = dispatch("list_tasks", &json!({"status": "completed"}), &ctx).await;
    assert_eq!(completed["count"], json!(1));
    assert_eq!(completed["tasks"][0]["title"], json!("First"));
}

#[tokio::test]
async fn test_list_tasks_is_user_scoped() {
    let database = test_database().await;
    let mine = context_for(&database, "user-1");
    let theirs = context_for(&database, "user-2");

    add(&mine, "Mine only").await;

    let result = dispatch("list_tasks", &json!({}), &theirs).await;
    assert_eq!(result["count"], json!(0));
}

#[tokio::test]
async fn test_complete_task_by_title_substring() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Buy groceries").await;

    let result = dispatch("complete_task", &json!({"title": "GROC"}), &ctx).await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["task"]["completed"], json!(true));
    assert!(result["task"]["updated_at"].is_string());
}

#[tokio::test]
async fn test_title_lookup_no_match() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Buy groceries").await;

    let result = dispatch("complete_task", &json!({"title": "laundry"}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], json!("No task found matching 'laundry'"));
}

#[tokio::test]
async fn test_title_lookup_ambiguous() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Buy milk").await;
    add(&ctx, "Buy bread").await;

    let result = dispatch("delete_task", &json!({"title": "buy"}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    let error = result["error"].as_str().unwrap();
    assert!(error.starts_with("Multiple tasks match 'buy':"));
    assert!(error.contains("Buy milk"));
    assert!(error.contains("Buy bread"));
    assert!(error.ends_with("Please be more specific."));
}

#[tokio::test]
async fn test_complete_task_requires_reference() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch("complete_task", &json!({}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], json!("Either task_id or title is required"));
}

#[tokio::test]
async fn test_complete_task_can_reopen() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Write report").await;
    dispatch("complete_task", &json!({"title": "report"}), &ctx).await;

    let reopened = dispatch(
        "complete_task",
        &json!({"title": "report", "completed": false}),
        &ctx,
    )
    .await;
    assert_eq!(reopened["task"]["completed"], json!(false));
}

#[tokio::test]
async fn test_delete_task_by_id() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let added = add(&ctx, "Temporary").await;
    let id = added["task"]["id"].as_str().unwrap();

    let result = dispatch("delete_task", &json!({"task_id": id}), &ctx).await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["deleted_task_id"], json!(id));

    let listing = dispatch("list_tasks", &json!({}), &ctx).await;
    assert_eq!(listing["count"], json!(0));
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch(
        "delete_task",
        &json!({"task_id": "00000000-0000-0000-0000-000000000000"}),
        &ctx,
    )
    .await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], json!("Task not found"));
}

#[tokio::test]
async fn test_update_task_by_search_title() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Draft report").await;

    let result = dispatch(
        "update_task",
        &json!({"search_title": "draft", "title": "Finish quarterly report"}),
        &ctx,
    )
    .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["task"]["title"], json!("Finish quarterly report"));
}

#[tokio::test]
async fn test_update_task_requires_some_change() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    add(&ctx, "Unchanged").await;

    let result = dispatch("update_task", &json!({"search_title": "unchanged"}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(
        result["error"],
        json!("At least one of title or description is required to update")
    );
}

#[tokio::test]
async fn test_update_task_requires_reference() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch("update_task", &json!({"title": "New name"}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(
        result["error"],
        json!("Either task_id or search_title is required")
    );
}

#[tokio::test]
async fn test_get_current_user_details() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch("get_current_user", &json!({}), &ctx).await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["user"]["user_id"], json!("user-1"));
    assert_eq!(result["user"]["name"], json!("Tool Tester"));
    assert_eq!(result["user"]["email"], json!("tools@example.com"));
}

#[tokio::test]
async fn test_get_current_user_without_details() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch(
        "get_current_user",
        &json!({"include_details": false}),
        &ctx,
    )
    .await;
    assert_eq!(result["user"]["user_id"], json!("user-1"));
    assert!(result["user"].get("name").is_none());
    assert!(result["user"].get("email").is_none());
}

#[tokio::test]
async fn test_get_current_user_missing_claims() {
    let database = test_database().await;
    let ctx = ToolContext {
        task_manager: database.tasks(),
        user_id: "user-1".to_owned(),
        email: None,
        name: None,
    };

    let result = dispatch("get_current_user", &json!({}), &ctx).await;
    assert_eq!(result["user"]["name"], json!("Unknown"));
    assert_eq!(result["user"]["email"], json!("unknown"));
}

#[tokio::test]
async fn test_unknown_tool_name() {
    let database = test_database().await;
    let ctx = context_for(&database, "user-1");

    let result = dispatch("teleport_task", &json!({}), &ctx).await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], json!("Unknown tool: teleport_task"));
}
