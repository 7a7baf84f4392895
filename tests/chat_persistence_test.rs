// ABOUTME: Integration tests for conversation resolution and turn persistence
// ABOUTME: Covers the persistence policy, ownership scoping, and message ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::test_database;
use serde_json::json;
use taskchat_server::constants::AGENT_APOLOGY;
use taskchat_server::services::ChatOrchestrationService;
use taskchat_server::tools::ToolCallRecord;

#[tokio::test]
async fn test_resolve_creates_new_conversation() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    assert_eq!(conversation.user_id, "user-1");

    let stored = database
        .chat()
        .get_conversation(&conversation.id, "user-1")
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_resolve_reuses_existing_conversation() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let first = service.resolve_conversation("user-1", None).await.unwrap();
    let second = service
        .resolve_conversation("user-1", Some(&first.id))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn test_resolve_unknown_id_creates_new() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database);

    let conversation = service
        .resolve_conversation("user-1", Some("11111111-1111-1111-1111-111111111111"))
        .await
        .unwrap();
    assert_ne!(conversation.id, "11111111-1111-1111-1111-111111111111");
    assert_eq!(conversation.user_id, "user-1");
}

#[tokio::test]
async fn test_resolve_foreign_conversation_creates_new() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let foreign = database.chat().create_conversation("someone-else").await.unwrap();
    let conversation = service
        .resolve_conversation("user-1", Some(&foreign.id))
        .await
        .unwrap();
    assert_ne!(conversation.id, foreign.id);
}

#[tokio::test]
async fn test_persist_turn_stores_both_messages() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    let calls = vec![ToolCallRecord {
        tool: "add_task".to_owned(),
        params: json!({"title": "Milk"}),
        result: json!({"success": true}),
    }];

    service
        .persist_turn(&conversation.id, "add milk", "Added milk.", &calls)
        .await
        .unwrap();

    let messages = database
        .chat()
        .recent_messages(&conversation.id, 10)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[0].content, "add milk");
    assert!(messages[0].tool_calls.is_none());
    assert_eq!(messages[1].role, "assistant");

    let stored: serde_json::Value =
        serde_json::from_str(messages[1].tool_calls.as_deref().unwrap()).unwrap();
    assert_eq!(stored["calls"][0]["tool"], json!("add_task"));
    assert_eq!(stored["calls"][0]["params"]["title"], json!("Milk"));
}

#[tokio::test]
async fn test_persist_turn_without_tool_calls_stores_null() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    service
        .persist_turn(&conversation.id, "hello", "Hi!", &[])
        .await
        .unwrap();

    let messages = database
        .chat()
        .recent_messages(&conversation.id, 10)
        .await
        .unwrap();
    assert!(messages[1].tool_calls.is_none());
}

#[tokio::test]
async fn test_failed_turn_keeps_user_message_only() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    service
        .persist_turn(&conversation.id, "add milk", AGENT_APOLOGY, &[])
        .await
        .unwrap();

    let messages = database
        .chat()
        .recent_messages(&conversation.id, 10)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, "user");
}

#[tokio::test]
async fn test_empty_response_is_not_persisted() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    service
        .persist_turn(&conversation.id, "loop", "", &[])
        .await
        .unwrap();

    let messages = database
        .chat()
        .recent_messages(&conversation.id, 10)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_turn_bumps_conversation_timestamp() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service
        .persist_turn(&conversation.id, "hello", AGENT_APOLOGY, &[])
        .await
        .unwrap();

    let updated = database
        .chat()
        .get_conversation(&conversation.id, "user-1")
        .await
        .unwrap()
        .unwrap();
    assert!(updated.updated_at >= conversation.updated_at);
}

#[tokio::test]
async fn test_message_window_is_chronological_and_bounded() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let conversation = service.resolve_conversation("user-1", None).await.unwrap();
    for i in 0..6 {
        service
            .persist_turn(
                &conversation.id,
                &format!("question {i}"),
                &format!("answer {i}"),
                &[],
            )
            .await
            .unwrap();
    }

    // 12 messages stored; ask for the last 4
    let window = database
        .chat()
        .recent_messages(&conversation.id, 4)
        .await
        .unwrap();
    assert_eq!(window.len(), 4);
    assert_eq!(window[0].content, "question 4");
    assert_eq!(window[1].content, "answer 4");
    assert_eq!(window[2].content, "question 5");
    assert_eq!(window[3].content, "answer 5");
}

#[tokio::test]
async fn test_conversation_listing_is_most_recent_first() {
    let database = test_database().await;
    let service = ChatOrchestrationService::new(database.clone());

    let first = service.resolve_conversation("user-1", None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = service.resolve_conversation("user-1", None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    // Touch the first conversation so it becomes the most recent
    service
        .persist_turn(&first.id, "back again", "Welcome back.", &[])
        .await
        .unwrap();

    let listing = database.chat().list_conversations("user-1", 10).await.unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, first.id);
    assert_eq!(listing[1].id, second.id);
}
