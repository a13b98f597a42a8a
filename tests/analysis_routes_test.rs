// ABOUTME: Integration tests for the analysis routes
// ABOUTME: Covers empty-conversation validation, the empty-history query shortcut, and insights
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

async fn seed_conversation(
    resources: &Arc<ServerResources>,
    user_id: Uuid,
    title: &str,
    provider: AiProvider,
    tags: &[&str],
    message_count: usize,
    age_minutes: i64,
) -> Conversation {
    let mut conversation = Conversation::new(user_id, provider, "gpt-3.5-turbo");
    conversation.title = title.to_owned();
    conversation.set_tags(tags.iter().map(|t| (*t).to_owned()).collect());
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
async fn summarize_missing_conversation_is_not_found() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let response = AxumTestRequest::post(&format!("/api/analysis/summarize/{}", Uuid::new_v4()))
        .bearer(&token)
        .send(app)
        .await;

    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "Conversation not found");
}

#[tokio::test]
async fn summarize_and_analyze_reject_empty_conversations() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let empty =
        seed_conversation(&resources, user_id, "Empty", AiProvider::Openai, &[], 0, 0).await;

    let response = AxumTestRequest::post(&format!("/api/analysis/summarize/{}", empty.id))
        .bearer(&token)
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Cannot summarize empty conversation");

    let response = AxumTestRequest::post(&format!("/api/analysis/analyze/{}", empty.id))
        .bearer(&token)
        .send(app)
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Cannot analyze empty conversation");
}

#[tokio::test]
async fn summarize_surfaces_provider_failures_without_mutation() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let conversation =
        seed_conversation(&resources, user_id, "Chat", AiProvider::Openai, &[], 2, 0).await;

    // No credentials configured, so the adapter fails before the network
    let response = AxumTestRequest::post(&format!("/api/analysis/summarize/{}", conversation.id))
        .bearer(&token)
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
    assert!(reloaded.summary.is_empty());
}

#[tokio::test]
async fn query_requires_a_question() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let response = AxumTestRequest::post("/api/analysis/query")
        .bearer(&token)
        .json(&json!({"query": ""}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Query is required");
}

#[tokio::test]
async fn query_with_no_history_answers_without_a_provider_call() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    // Succeeds even though no provider is configured: the empty-history
    // shortcut never reaches the adapter
    let response = AxumTestRequest::post("/api/analysis/query")
        .bearer(&token)
        .json(&json!({"query": "what did we talk about?"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["conversations_analyzed"], 0);
    assert!(body["data"]["answer"]
        .as_str()
        .unwrap()
        .contains("don't have any conversations yet"));
}

#[tokio::test]
async fn query_skips_archived_conversations() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let mut archived =
        seed_conversation(&resources, user_id, "Archived", AiProvider::Openai, &[], 2, 0).await;
    archived.is_archived = true;
    resources
        .database
        .conversations()
        .save(&mut archived)
        .await
        .unwrap();

    // Only archived history exists, so the shortcut fires
    let response = AxumTestRequest::post("/api/analysis/query")
        .bearer(&token)
        .json(&json!({"query": "anything?"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["conversations_analyzed"], 0);
}

#[tokio::test]
async fn insights_with_no_history_returns_zero_totals() {
    let (app, _resources) = common::create_test_app().await.unwrap();
    let (_, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    let response = AxumTestRequest::get("/api/analysis/insights")
        .bearer(&token)
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let stats = &body["data"]["statistics"];
    assert_eq!(stats["total_conversations"], 0);
    assert_eq!(stats["total_messages"], 0);
    assert_eq!(stats["avg_messages_per_conversation"], 0.0);
    assert_eq!(body["data"]["top_tags"], json!([]));
    assert_eq!(body["data"]["recent_activity"], json!([]));
}

#[tokio::test]
async fn insights_aggregates_tags_providers_and_activity() {
    let (app, resources) = common::create_test_app().await.unwrap();
    let (user_id, token) = common::register_user(app.clone(), "alice", "alice@example.com").await;

    seed_conversation(
        &resources,
        user_id,
        "Rust chat",
        AiProvider::Openai,
        &["rust", "async"],
        3,
        30,
    )
    .await;
    seed_conversation(
        &resources,
        user_id,
        "More rust",
        AiProvider::Openai,
        &["rust"],
        2,
        20,
    )
    .await;
    seed_conversation(
        &resources,
        user_id,
        "Gemini chat",
        AiProvider::Gemini,
        &[],
        1,
        10,
    )
    .await;

    let response = AxumTestRequest::get("/api/analysis/insights")
        .bearer(&token)
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let data = &body["data"];

    assert_eq!(data["statistics"]["total_conversations"], 3);
    assert_eq!(data["statistics"]["total_messages"], 6);
    assert_eq!(data["statistics"]["avg_messages_per_conversation"], 2.0);

    assert_eq!(data["top_tags"][0]["tag"], "rust");
    assert_eq!(data["top_tags"][0]["count"], 2);

    assert_eq!(data["provider_usage"]["openai"], 2);
    assert_eq!(data["provider_usage"]["gemini"], 1);

    let recent = data["recent_activity"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["title"], "Gemini chat");
    assert_eq!(recent[0]["message_count"], 1);
}

#[tokio::test]
async fn analysis_routes_require_authentication() {
    let (app, _resources) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::get("/api/analysis/insights").send(app.clone()).await;
    assert_eq!(response.status(), 401);

    let response = AxumTestRequest::post("/api/analysis/query")
        .json(&json!({"query": "hi"}))
        .send(app)
        .await;
    assert_eq!(response.status(), 401);
}
