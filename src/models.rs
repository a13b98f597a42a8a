// ABOUTME: Core domain models for users, conversations, and messages
// ABOUTME: Holds the conversation document invariants (auto-title, last-activity timestamp)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Domain Models
//!
//! Users, conversations, and messages. A [`Conversation`] is a document:
//! its messages are embedded inline, ordered, and immutable once appended.
//! Two invariants live here rather than in the store:
//!
//! - `last_message_at` always equals the timestamp of the final message
//!   when messages are non-empty ([`Conversation::refresh_last_message_at`],
//!   applied on every save).
//! - The title auto-derives from the first user message only while still at
//!   the default value ([`Conversation::auto_generate_title`]) - a one-time,
//!   one-directional transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::AppError;

/// Default title for freshly created conversations
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Maximum characters taken from the first user message for the auto-title
const AUTO_TITLE_MAX_CHARS: usize = 50;

// ============================================================================
// Providers and Preferences
// ============================================================================

/// One of the four external LLM providers reachable over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// OpenAI chat completions API
    Openai,
    /// Anthropic Claude messages API
    Claude,
    /// Google Gemini generative language API
    Gemini,
    /// LM Studio local server (OpenAI-compatible)
    Lmstudio,
}

impl AiProvider {
    /// String tag used on the wire and in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Lmstudio => "lmstudio",
        }
    }

    /// Parse a provider tag, rejecting unknown values
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProvider` for any tag outside the four known
    /// providers.
    pub fn parse(tag: &str) -> Result<Self, AppError> {
        match tag {
            "openai" => Ok(Self::Openai),
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            "lmstudio" => Ok(Self::Lmstudio),
            other => Err(AppError::unsupported_provider(other)),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// String tag used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse a theme tag
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown values.
    pub fn parse(tag: &str) -> Result<Self, AppError> {
        match tag {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(AppError::invalid_input(format!("Unknown theme: {other}"))),
        }
    }
}

/// Per-user preference fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Provider used when a chat request names none
    pub default_provider: AiProvider,
    /// UI theme
    pub theme: Theme,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_provider: AiProvider::Openai,
            theme: Theme::Light,
        }
    }
}

// ============================================================================
// User
// ============================================================================

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Display name, unique
    pub username: String,
    /// Email address, unique
    pub email: String,
    /// Bcrypt password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Preference fields
    pub preferences: UserPreferences,
    /// When the user registered
    pub created_at: DateTime<Utc>,
    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user (what API responses carry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique user ID
    pub id: Uuid,
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Preference fields
    pub preferences: UserPreferences,
    /// When the user registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public profile with the credential fields stripped
    #[must_use]
    pub fn public_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            preferences: self.preferences.clone(),
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// String representation for provider API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Provenance metadata attached to assistant messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Model that produced the message
    pub model: String,
    /// Total tokens the provider reported (zero when it reports none)
    pub tokens: u32,
    /// Provider that produced the message
    pub provider: AiProvider,
}

/// A single message in a conversation, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the sender
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
    /// Provenance metadata (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Create a user message timestamped now
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create an assistant message with provenance metadata
    #[must_use]
    pub fn assistant(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Some(metadata),
        }
    }
}

// ============================================================================
// Conversation
// ============================================================================

/// A user-owned ordered sequence of chat messages plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Title (auto-derived from the first user message while default)
    pub title: String,
    /// Ordered message list, embedded inline
    pub messages: Vec<Message>,
    /// Provider this conversation talks to
    pub provider: AiProvider,
    /// Model name used for provider calls
    pub model: String,
    /// Free-text summary (set by the summarize operation)
    pub summary: String,
    /// Tag set (trimmed, lowercased, deduplicated)
    pub tags: Vec<String>,
    /// Archive flag
    pub is_archived: bool,
    /// Timestamp of the final message (or creation time while empty)
    pub last_message_at: DateTime<Utc>,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation was last saved
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation for a user
    #[must_use]
    pub fn new(user_id: Uuid, provider: AiProvider, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: DEFAULT_CONVERSATION_TITLE.to_owned(),
            messages: Vec::new(),
            provider,
            model: model.into(),
            summary: String::new(),
            tags: Vec::new(),
            is_archived: false,
            last_message_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to the ordered list
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Recompute `last_message_at` from the final message
    ///
    /// Invoked by the store on every save so the invariant holds after any
    /// append.
    pub fn refresh_last_message_at(&mut self) {
        if let Some(last) = self.messages.last() {
            self.last_message_at = last.timestamp;
        }
    }

    /// Derive the title from the first user message
    ///
    /// Only fires while the title is still exactly the default string; once
    /// the title has changed (auto or manual) this is a no-op forever.
    pub fn auto_generate_title(&mut self) {
        if self.title != DEFAULT_CONVERSATION_TITLE {
            return;
        }
        let Some(first_user) = self.messages.iter().find(|m| m.role == MessageRole::User) else {
            return;
        };

        let truncated: String = first_user.content.chars().take(AUTO_TITLE_MAX_CHARS).collect();
        self.title = if first_user.content.chars().count() > AUTO_TITLE_MAX_CHARS {
            format!("{truncated}...")
        } else {
            truncated
        };
    }

    /// Replace the tag set, normalizing each tag (trim + lowercase) and
    /// dropping empties and duplicates while preserving first-seen order
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags.clear();
        for tag in tags {
            let normalized = tag.trim().to_lowercase();
            if !normalized.is_empty() && !self.tags.contains(&normalized) {
                self.tags.push(normalized);
            }
        }
    }

    /// Merge suggested tags into the tag set (deduplicated union)
    ///
    /// Returns `true` when the set changed.
    pub fn merge_tags(&mut self, suggested: &[String]) -> bool {
        let mut changed = false;
        for tag in suggested {
            let normalized = tag.trim().to_lowercase();
            if !normalized.is_empty() && !self.tags.contains(&normalized) {
                self.tags.push(normalized);
                changed = true;
            }
        }
        changed
    }
}
