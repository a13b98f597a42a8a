// ABOUTME: Conversation store - document CRUD with ownership-scoped queries
// ABOUTME: Persists messages and tags as embedded JSON, maintains the last-activity timestamp on save
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::users::parse_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, Conversation, Message};

/// Default page size for conversation listings
const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Query parameters for listing conversations
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size
    pub limit: Option<i64>,
    /// Case-insensitive substring match on title and tags
    pub search: Option<String>,
    /// Filter by archive flag
    pub archived: Option<bool>,
}

/// Conversation list view without message bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Provider tag
    pub provider: AiProvider,
    /// Model name
    pub model: String,
    /// Free-text summary
    pub summary: String,
    /// Tag set
    pub tags: Vec<String>,
    /// Archive flag
    pub is_archived: bool,
    /// Timestamp of the final message
    pub last_message_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last save timestamp
    pub updated_at: DateTime<Utc>,
}

/// One page of a conversation listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationListPage {
    /// Conversations on this page (no message bodies)
    pub conversations: Vec<ConversationSummary>,
    /// Total pages for the filter
    pub total_pages: i64,
    /// 1-based page number served
    pub current_page: i64,
    /// Total conversations matching the filter
    pub total: i64,
}

/// Conversation database operations
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    /// Create a new conversation store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a conversation document (insert or replace by id)
    ///
    /// Recomputes `last_message_at` from the final message and bumps
    /// `updated_at` before writing, so the invariant holds after every
    /// save regardless of which handler appended messages.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, conversation: &mut Conversation) -> AppResult<()> {
        conversation.refresh_last_message_at();
        conversation.updated_at = Utc::now();

        let messages_json = serde_json::to_string(&conversation.messages)?;
        let tags_json = serde_json::to_string(&conversation.tags)?;

        sqlx::query(
            r"
            INSERT INTO conversations
                (id, user_id, title, messages, provider, model, summary, tags, is_archived, last_message_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                messages = excluded.messages,
                provider = excluded.provider,
                model = excluded.model,
                summary = excluded.summary,
                tags = excluded.tags,
                is_archived = excluded.is_archived,
                last_message_at = excluded.last_message_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.title)
        .bind(&messages_json)
        .bind(conversation.provider.as_str())
        .bind(&conversation.model)
        .bind(&conversation.summary)
        .bind(&tags_json)
        .bind(conversation.is_archived)
        .bind(conversation.last_message_at.to_rfc3339())
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save conversation: {e}")))?;

        Ok(())
    }

    /// Fetch a conversation by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns a database error on failure; an ownership miss is `None`.
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch conversation: {e}")))?;

        row.map(row_to_conversation).transpose()
    }

    /// List a user's conversations without message bodies
    ///
    /// Supports the archive filter, case-insensitive substring search over
    /// title and tags, and offset/limit pagination, sorted by last
    /// activity descending.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn list(&self, user_id: Uuid, params: &ListParams) -> AppResult<ConversationListPage> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut where_clause = String::from("WHERE user_id = $1");
        if params.archived.is_some() {
            where_clause.push_str(" AND is_archived = $2");
        }
        let search_pattern = params
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));
        if search_pattern.is_some() {
            // Tags are stored as a JSON array of lowercased strings, so a
            // substring match on the column text covers tag search.
            let idx = if params.archived.is_some() { 3 } else { 2 };
            where_clause.push_str(&format!(
                " AND (LOWER(title) LIKE ${idx} OR tags LIKE ${idx})"
            ));
        }

        let list_sql = format!(
            "SELECT id, title, provider, model, summary, tags, is_archived, last_message_at, created_at, updated_at \
             FROM conversations {where_clause} \
             ORDER BY last_message_at DESC LIMIT {limit} OFFSET {offset}"
        );
        let count_sql = format!("SELECT COUNT(*) AS count FROM conversations {where_clause}");

        let mut list_query = sqlx::query(&list_sql).bind(user_id.to_string());
        let mut count_query = sqlx::query(&count_sql).bind(user_id.to_string());
        if let Some(archived) = params.archived {
            list_query = list_query.bind(archived);
            count_query = count_query.bind(archived);
        }
        if let Some(ref pattern) = search_pattern {
            list_query = list_query.bind(pattern);
            count_query = count_query.bind(pattern);
        }

        let rows = list_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count conversations: {e}")))?
            .get("count");

        let conversations = rows
            .into_iter()
            .map(row_to_summary)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ConversationListPage {
            conversations,
            total_pages: (total + limit - 1) / limit,
            current_page: page,
            total,
        })
    }

    /// Delete a conversation, scoped to its owner
    ///
    /// Returns `false` on an ownership miss (caller maps that to 404).
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's most recently active unarchived conversations, full
    /// documents, newest first (context for natural-language queries)
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM conversations
            WHERE user_id = $1 AND is_archived = 0
            ORDER BY last_message_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch recent conversations: {e}")))?;

        rows.into_iter().map(row_to_conversation).collect()
    }

    /// All of a user's conversations, full documents (insights aggregation)
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn list_all(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query("SELECT * FROM conversations WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch conversations: {e}")))?;

        rows.into_iter().map(row_to_conversation).collect()
    }
}

/// Map a full conversations row to the domain document
fn row_to_conversation(row: sqlx::sqlite::SqliteRow) -> AppResult<Conversation> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let messages: String = row.get("messages");
    let provider: String = row.get("provider");
    let tags: String = row.get("tags");
    let last_message_at: String = row.get("last_message_at");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Conversation {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        title: row.get("title"),
        messages: serde_json::from_str::<Vec<Message>>(&messages)?,
        provider: AiProvider::parse(&provider)?,
        model: row.get("model"),
        summary: row.get("summary"),
        tags: serde_json::from_str::<Vec<String>>(&tags)?,
        is_archived: row.get("is_archived"),
        last_message_at: parse_timestamp(&last_message_at)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Map a projected row (no messages) to the list view
fn row_to_summary(row: sqlx::sqlite::SqliteRow) -> AppResult<ConversationSummary> {
    let id: String = row.get("id");
    let provider: String = row.get("provider");
    let tags: String = row.get("tags");
    let last_message_at: String = row.get("last_message_at");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ConversationSummary {
        id: parse_uuid(&id)?,
        title: row.get("title"),
        provider: AiProvider::parse(&provider)?,
        model: row.get("model"),
        summary: row.get("summary"),
        tags: serde_json::from_str::<Vec<String>>(&tags)?,
        is_archived: row.get("is_archived"),
        last_message_at: parse_timestamp(&last_message_at)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Parse a UUID column
fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Corrupt id column: {e}")))
}
