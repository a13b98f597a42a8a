// ABOUTME: Integration tests for the chat and conversation management routes
// ABOUTME: Covers provider failure atomicity, pagination, search, and ownership scoping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod common;
mod helpers;

use chat_portal::models::{AiProvider, Conversation, Message};
use chat_portal::server::ServerResources;
use chrono::{Duration, Utc};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Seed a saved conversation with `message_count` user messages, spacing the
/// last message `age_minutes` into the past so list ordering is deterministic
async fn seed_conversation(
    resources: &Arc<ServerResources>,
    user_id: Uuid,
    title: &str,
    message_count: usize,
    age_minutes: i64,
) -> Conversation {
    let mut conversation = Conversation::new(user_id, AiProvider::Openai, "gpt-3.5-turbo");
    conversation.title = title.to_owned();
    for i in 0..message_count {
        let mut message = Message::user(format!("message {i}"));
        message.timestamp = Utc::now() - Duration::minutes(age_minutes);
        conversation.push_message(message);
    }

    resources
        .database
        .conversations()
        .save(&mut conversation)
        .await
        .unwrap();
    conversation
}

#[tokio::test]
async fn chat_requires_message_content() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let response = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": ""}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Message content is required");
}

#[tokio::test]
async fn chat_rejects_unknown_provider_tags() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let response = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "hi", "provider": "grok"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Unsupported AI provider: grok");
}

#[tokio::test]
async fn failed_provider_call_persists_nothing() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    // No credentials are configured in tests, so the adapter fails before
    // any network traffic
    let response = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "hello there"}))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Please configure your API keys"));

    // The aborted request left no conversation behind
    let page = resources
        .database
        .conversations()
        .list(user_id, &chat_portal::database::ListParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn failed_provider_call_leaves_existing_conversation_unchanged() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let conversation = seed_conversation(&resources, user_id, "Seeded", 2, 0).await;

    let response = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({
            "conversation_id": conversation.id,
            "message": "another message",
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), 500);

    let reloaded = resources
        .database
        .conversations()
        .get(conversation.id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.messages.len(), 2);
}

#[tokio::test]
async fn chat_against_a_foreign_conversation_is_not_found() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (owner_id, _) = common::register_user(app.clone(), "owner", "owner@example.com").await;
    let (_, intruder_token) =
        common::register_user(app.clone(), "intruder", "intruder@example.com").await;

    let conversation = seed_conversation(&resources, owner_id, "Private", 1, 0).await;

    let response = AxumTestRequest::post("/api/chat")
        .bearer(&intruder_token)
        .json(&json!({"conversation_id": conversation.id, "message": "hi"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_is_sorted_by_last_activity_and_paginated() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    seed_conversation(&resources, user_id, "Oldest", 1, 30).await;
    seed_conversation(&resources, user_id, "Middle", 1, 20).await;
    seed_conversation(&resources, user_id, "Newest", 1, 10).await;

    let response = AxumTestRequest::get("/api/chat/conversations?page=1&limit=2")
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let conversations = body["data"]["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0]["title"], "Newest");
    assert_eq!(conversations[1]["title"], "Middle");
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["current_page"], 1);
    // List view omits message bodies
    assert!(conversations[0].get("messages").is_none());

    let response = AxumTestRequest::get("/api/chat/conversations?page=2&limit=2")
        .bearer(&token)
        .send(app)
        .await;
    let body: Value = response.json();
    let conversations = body["data"]["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["title"], "Oldest");
}

#[tokio::test]
async fn list_filters_by_search_and_archive_flag() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    seed_conversation(&resources, user_id, "Rust lifetimes", 1, 10).await;
    let mut archived = seed_conversation(&resources, user_id, "Old stuff", 1, 20).await;
    archived.is_archived = true;
    resources
        .database
        .conversations()
        .save(&mut archived)
        .await
        .unwrap();

    let response = AxumTestRequest::get("/api/chat/conversations?search=rust")
        .bearer(&token)
        .send(app.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["conversations"][0]["title"], "Rust lifetimes");

    let response = AxumTestRequest::get("/api/chat/conversations?archived=true")
        .bearer(&token)
        .send(app.clone())
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["conversations"][0]["title"], "Old stuff");

    let response = AxumTestRequest::get("/api/chat/conversations?archived=false")
        .bearer(&token)
        .send(app)
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["conversations"][0]["title"], "Rust lifetimes");
}

#[tokio::test]
async fn get_returns_the_full_transcript() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let conversation = seed_conversation(&resources, user_id, "Full", 3, 0).await;

    let response = AxumTestRequest::get(&format!("/api/chat/conversations/{}", conversation.id))
        .bearer(&token)
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let messages = body["data"]["conversation"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["content"], "message 0");
}

#[tokio::test]
async fn update_normalizes_tags_and_flips_the_archive_flag() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let conversation = seed_conversation(&resources, user_id, "Tagged", 1, 0).await;

    let response = AxumTestRequest::put(&format!("/api/chat/conversations/{}", conversation.id))
        .bearer(&token)
        .json(&json!({
            "title": "Renamed",
            "tags": ["  Rust ", "ASYNC", "rust"],
            "is_archived": true,
        }))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let updated = &body["data"]["conversation"];
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["tags"], json!(["rust", "async"]));
    assert_eq!(updated["is_archived"], true);
}

#[tokio::test]
async fn cross_user_access_is_always_not_found() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (owner_id, _) = common::register_user(app.clone(), "owner", "owner@example.com").await;
    let (_, intruder_token) =
        common::register_user(app.clone(), "intruder", "intruder@example.com").await;

    let conversation = seed_conversation(&resources, owner_id, "Private", 1, 0).await;
    let uri = format!("/api/chat/conversations/{}", conversation.id);

    let get = AxumTestRequest::get(&uri)
        .bearer(&intruder_token)
        .send(app.clone())
        .await;
    assert_eq!(get.status(), 404);

    let update = AxumTestRequest::put(&uri)
        .bearer(&intruder_token)
        .json(&json!({"title": "stolen"}))
        .send(app.clone())
        .await;
    assert_eq!(update.status(), 404);

    let delete = AxumTestRequest::delete(&uri)
        .bearer(&intruder_token)
        .send(app)
        .await;
    assert_eq!(delete.status(), 404);

    // Still owned and untouched
    let reloaded = resources
        .database
        .conversations()
        .get(conversation.id, owner_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, "Private");
}

#[tokio::test]
async fn delete_removes_the_conversation() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let conversation = seed_conversation(&resources, user_id, "Doomed", 1, 0).await;
    let uri = format!("/api/chat/conversations/{}", conversation.id);

    let response = AxumTestRequest::delete(&uri).bearer(&token).send(app.clone()).await;
    assert_eq!(response.status(), 200);

    let response = AxumTestRequest::delete(&uri).bearer(&token).send(app).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn unknown_routes_return_the_error_envelope() {
    let (app, _resources) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::get("/api/nope").send(app).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}
