// ABOUTME: Chat routes - message send plus conversation list/get/update/delete
// ABOUTME: Orchestrates load-or-create, adapter call, auto-title, and persist for each chat turn
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{authenticate, ApiResponse};
use crate::database::{ConversationSummary, ListParams};
use crate::errors::{AppError, AppResult};
use crate::llm::ChatMessage;
use crate::models::{AiProvider, Conversation, Message};
use crate::server::ServerResources;

/// Model applied to brand-new conversations when none is requested
const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Chat message request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation to continue; omitted to start a new one
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    /// User message content
    #[serde(default)]
    pub message: String,
    /// Provider override for this conversation
    #[serde(default)]
    pub provider: Option<String>,
    /// Model override for a new conversation
    #[serde(default)]
    pub model: Option<String>,
}

/// Updated transcript returned after a chat turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The conversation after both messages were appended
    pub conversation: ConversationView,
    /// The assistant's reply text, duplicated for convenience
    pub response: String,
}

/// Conversation fields echoed back from the chat endpoint
#[derive(Debug, Serialize)]
pub struct ConversationView {
    /// Conversation ID
    pub id: Uuid,
    /// Title (possibly just auto-generated)
    pub title: String,
    /// Full transcript
    pub messages: Vec<Message>,
    /// Provider tag
    pub provider: AiProvider,
    /// Model name
    pub model: String,
}

/// Query parameters for the conversation list
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    /// 1-based page number
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size
    #[serde(default)]
    pub limit: Option<i64>,
    /// Substring filter on title and tags
    #[serde(default)]
    pub search: Option<String>,
    /// Archive filter
    #[serde(default)]
    pub archived: Option<bool>,
}

/// Conversation list payload
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Page of conversations, message bodies omitted
    pub conversations: Vec<ConversationSummary>,
    /// Total pages for the filter
    pub total_pages: i64,
    /// Page served
    pub current_page: i64,
    /// Total matching conversations
    pub total: i64,
}

/// Single conversation payload
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    /// Full conversation document
    pub conversation: Conversation,
}

/// Update request for title, tags, or the archive flag
#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    /// New title, when changing it
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement tag set, when changing it
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// New archive flag, when changing it
    #[serde(default)]
    pub is_archived: Option<bool>,
}

/// Deletion confirmation payload
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Confirmation text
    pub message: String,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat route handlers
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::send_message))
            .route("/api/chat/conversations", get(Self::list_conversations))
            .route("/api/chat/conversations/:id", get(Self::get_conversation))
            .route("/api/chat/conversations/:id", put(Self::update_conversation))
            .route(
                "/api/chat/conversations/:id",
                delete(Self::delete_conversation),
            )
            .with_state(resources)
    }

    /// Send a message: load or create the conversation, call the provider,
    /// append both turns, auto-title, persist
    ///
    /// A provider failure aborts before the save, so a failed AI call
    /// leaves no partial conversation mutation behind.
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatRequest>,
    ) -> AppResult<Json<ApiResponse<ChatResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        if request.message.is_empty() {
            return Err(AppError::missing_field("Message content is required"));
        }

        let provider = match request.provider {
            Some(ref tag) => AiProvider::parse(tag)?,
            None => user.preferences.default_provider,
        };

        let store = resources.database.conversations();
        let mut conversation = match request.conversation_id {
            Some(id) => store
                .get(id, user.id)
                .await?
                .ok_or_else(|| AppError::not_found("Conversation"))?,
            None => Conversation::new(
                user.id,
                provider,
                request.model.as_deref().unwrap_or(FALLBACK_MODEL),
            ),
        };

        conversation.push_message(Message::user(&request.message));

        let llm_messages: Vec<ChatMessage> =
            conversation.messages.iter().map(ChatMessage::from).collect();

        let ai_response = resources
            .ai
            .send_message(provider, &llm_messages, Some(&conversation.model))
            .await
            .map_err(chat_error_hint)?;

        conversation.push_message(Message::assistant(
            ai_response.content.clone(),
            ai_response.metadata,
        ));
        conversation.auto_generate_title();

        store.save(&mut conversation).await?;

        info!(
            conversation_id = %conversation.id,
            provider = %provider,
            "Chat turn completed"
        );

        Ok(Json(ApiResponse::new(ChatResponse {
            conversation: ConversationView {
                id: conversation.id,
                title: conversation.title,
                messages: conversation.messages,
                provider: conversation.provider,
                model: conversation.model,
            },
            response: ai_response.content,
        })))
    }

    /// Paginated, searchable, filterable list of the user's conversations
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListQuery>,
    ) -> AppResult<Json<ApiResponse<ListResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let page = resources
            .database
            .conversations()
            .list(
                user.id,
                &ListParams {
                    page: query.page,
                    limit: query.limit,
                    search: query.search,
                    archived: query.archived,
                },
            )
            .await?;

        Ok(Json(ApiResponse::new(ListResponse {
            conversations: page.conversations,
            total_pages: page.total_pages,
            current_page: page.current_page,
            total: page.total,
        })))
    }

    /// Full conversation with its transcript
    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<ApiResponse<ConversationResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let conversation = resources
            .database
            .conversations()
            .get(id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        Ok(Json(ApiResponse::new(ConversationResponse { conversation })))
    }

    /// Update title, tags, or archive flag
    async fn update_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(request): Json<UpdateConversationRequest>,
    ) -> AppResult<Json<ApiResponse<ConversationResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let store = resources.database.conversations();
        let mut conversation = store
            .get(id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if let Some(title) = request.title {
            conversation.title = title;
        }
        if let Some(tags) = request.tags {
            conversation.set_tags(tags);
        }
        if let Some(is_archived) = request.is_archived {
            conversation.is_archived = is_archived;
        }

        store.save(&mut conversation).await?;

        Ok(Json(ApiResponse::new(ConversationResponse { conversation })))
    }

    /// Delete a conversation
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> AppResult<Json<ApiResponse<DeleteResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let deleted = resources
            .database
            .conversations()
            .delete(id, user.id)
            .await?;

        if !deleted {
            return Err(AppError::not_found("Conversation"));
        }

        Ok(Json(ApiResponse::new(DeleteResponse {
            message: "Conversation deleted successfully".to_owned(),
        })))
    }
}

/// Rewrite adapter failures with an actionable hint derived from the
/// error text, keeping the original code and status
fn chat_error_hint(error: AppError) -> AppError {
    let message = &error.message;
    let hinted = if message.contains("API key not configured") {
        format!("{message}. Please configure your API keys in the backend environment variables.")
    } else if message.contains("quota") || message.contains("limit") {
        format!("API quota or rate limit exceeded: {message}")
    } else if message.contains("401") || message.contains("authentication") {
        format!("Authentication failed: {message}. Please check your API key.")
    } else if message.contains("model") {
        format!("Model error: {message}")
    } else {
        return error;
    };

    AppError::new(error.code, hinted)
}
