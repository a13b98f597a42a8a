// ABOUTME: Analysis routes - summarize-one, analyze-one, query-many, and aggregate insights
// ABOUTME: Merges suggested tags back into conversations and computes history-wide statistics
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{authenticate, ApiResponse};
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, Conversation};
use crate::server::ServerResources;

/// Conversations pulled in as query context when the caller gives no limit
const DEFAULT_QUERY_LIMIT: i64 = 10;

/// Tags reported by the insights endpoint
const TOP_TAGS: usize = 10;

/// Conversations shown in the recent-activity section
const RECENT_ACTIVITY: usize = 5;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Generated summary payload
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// The persisted summary text
    pub summary: String,
}

/// Analysis payload: whatever JSON object the model produced
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    /// Parsed analysis, or `{"raw_analysis": ...}` when unparseable
    pub analysis: serde_json::Value,
}

/// Natural-language history query
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    #[serde(default)]
    pub query: String,
    /// Provider override
    #[serde(default)]
    pub provider: Option<String>,
    /// How many recent conversations to use as context
    #[serde(default)]
    pub limit: Option<i64>,
}

/// History query answer
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// The model's answer
    pub answer: String,
    /// How many conversations fed the context
    pub conversations_analyzed: usize,
    /// Echo of the question, omitted for the empty-history shortcut
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Aggregate statistics payload
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    /// Conversation and message totals
    pub statistics: Statistics,
    /// Most-used tags, descending by count
    pub top_tags: Vec<TagCount>,
    /// Conversations per provider
    pub provider_usage: HashMap<AiProvider, usize>,
    /// Most recently active conversations
    pub recent_activity: Vec<RecentConversation>,
}

/// History-wide totals
#[derive(Debug, Serialize)]
pub struct Statistics {
    /// Total conversations
    pub total_conversations: usize,
    /// Total messages across all conversations
    pub total_messages: usize,
    /// Average messages per conversation, one decimal place
    pub avg_messages_per_conversation: f64,
}

/// One tag with its usage count
#[derive(Debug, Serialize)]
pub struct TagCount {
    /// Tag text
    pub tag: String,
    /// Conversations carrying it
    pub count: usize,
}

/// Recent-activity entry
#[derive(Debug, Serialize)]
pub struct RecentConversation {
    /// Conversation ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Timestamp of the final message
    pub last_message_at: DateTime<Utc>,
    /// Transcript length
    pub message_count: usize,
}

// ============================================================================
// Analysis Routes
// ============================================================================

/// Analysis route handlers
pub struct AnalysisRoutes;

impl AnalysisRoutes {
    /// Create all analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analysis/summarize/:id", post(Self::summarize))
            .route("/api/analysis/analyze/:id", post(Self::analyze))
            .route("/api/analysis/query", post(Self::query))
            .route("/api/analysis/insights", get(Self::insights))
            .with_state(resources)
    }

    /// Generate a summary and persist it on the conversation
    async fn summarize(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<ApiResponse<SummaryResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let store = resources.database.conversations();
        let mut conversation = store
            .get(id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if conversation.messages.is_empty() {
            return Err(AppError::invalid_input("Cannot summarize empty conversation"));
        }

        let summary = resources
            .ai
            .generate_summary(conversation.provider, &conversation.messages)
            .await?;

        conversation.summary.clone_from(&summary);
        store.save(&mut conversation).await?;

        info!(conversation_id = %id, "Summary generated");

        Ok(Json(ApiResponse::new(SummaryResponse { summary })))
    }

    /// Extract topics/sentiment/tags; merge suggested tags into the
    /// conversation when the model proposes any
    async fn analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<ApiResponse<AnalysisResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let store = resources.database.conversations();
        let mut conversation = store
            .get(id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if conversation.messages.is_empty() {
            return Err(AppError::invalid_input("Cannot analyze empty conversation"));
        }

        let analysis = resources
            .ai
            .analyze_conversation(conversation.provider, &conversation.messages)
            .await?;

        let suggested: Vec<String> = analysis
            .get("suggested_tags")
            .and_then(|tags| tags.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default();

        if conversation.merge_tags(&suggested) {
            store.save(&mut conversation).await?;
        }

        info!(conversation_id = %id, "Conversation analyzed");

        Ok(Json(ApiResponse::new(AnalysisResponse { analysis })))
    }

    /// Answer a free-text question over the most recent conversations
    async fn query(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<QueryRequest>,
    ) -> AppResult<Json<ApiResponse<QueryResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        if request.query.is_empty() {
            return Err(AppError::missing_field("Query is required"));
        }

        let limit = request.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let conversations = resources
            .database
            .conversations()
            .recent(user.id, limit)
            .await?;

        // Nothing to analyze; answer without spending a provider call
        if conversations.is_empty() {
            return Ok(Json(ApiResponse::new(QueryResponse {
                answer: "You don't have any conversations yet. Start chatting to build your \
                         history!"
                    .to_owned(),
                conversations_analyzed: 0,
                query: None,
            })));
        }

        let provider = match request.provider {
            Some(ref tag) => AiProvider::parse(tag)?,
            None => user.preferences.default_provider,
        };

        let answer = resources
            .ai
            .query_history(provider, &request.query, &conversations)
            .await?;

        Ok(Json(ApiResponse::new(QueryResponse {
            answer,
            conversations_analyzed: conversations.len(),
            query: Some(request.query),
        })))
    }

    /// Aggregate statistics across the user's whole history
    async fn insights(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<ApiResponse<InsightsResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let conversations = resources
            .database
            .conversations()
            .list_all(user.id)
            .await?;

        Ok(Json(ApiResponse::new(build_insights(&conversations))))
    }
}

/// Compute the insights payload from the full conversation list
fn build_insights(conversations: &[Conversation]) -> InsightsResponse {
    let total_conversations = conversations.len();
    let total_messages: usize = conversations.iter().map(|c| c.messages.len()).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg = if total_conversations == 0 {
        0.0
    } else {
        total_messages as f64 / total_conversations as f64
    };

    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for conv in conversations {
        for tag in &conv.tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut top_tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_owned(),
            count,
        })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    top_tags.truncate(TOP_TAGS);

    let mut provider_usage: HashMap<AiProvider, usize> = HashMap::new();
    for conv in conversations {
        *provider_usage.entry(conv.provider).or_default() += 1;
    }

    let mut by_activity: Vec<&Conversation> = conversations.iter().collect();
    by_activity.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    let recent_activity = by_activity
        .into_iter()
        .take(RECENT_ACTIVITY)
        .map(|conv| RecentConversation {
            id: conv.id,
            title: conv.title.clone(),
            last_message_at: conv.last_message_at,
            message_count: conv.messages.len(),
        })
        .collect();

    InsightsResponse {
        statistics: Statistics {
            total_conversations,
            total_messages,
            avg_messages_per_conversation: (avg * 10.0).round() / 10.0,
        },
        top_tags,
        provider_usage,
        recent_activity,
    }
}
