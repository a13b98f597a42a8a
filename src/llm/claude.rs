// ABOUTME: Anthropic messages API provider
// ABOUTME: Splits system-role turns out into the top-level system field the API requires
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiResponse, ChatMessage, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, MessageMetadata, MessageRole};

const API_URL: &str = "https://api.anthropic.com/v1/messages";

const API_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Hard completion cap, the messages API requires one
const MAX_TOKENS: u32 = 4096;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Anthropic messages API provider
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
}

impl ClaudeProvider {
    /// Create a provider with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Split the message list into the top-level system field and the
    /// remaining conversation turns
    fn convert_messages(messages: &[ChatMessage]) -> (String, Vec<WireMessage>) {
        let system = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let conversation = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| WireMessage {
                role: m.role.as_str().to_owned(),
                content: m.content.clone(),
            })
            .collect();

        (system, conversation)
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
            |_| {
                AppError::external_service(
                    "Anthropic",
                    format!(
                        "API error ({}): {}",
                        status,
                        body.chars().take(200).collect::<String>()
                    ),
                )
            },
            |error_response| match status.as_u16() {
                401 => AppError::external_service(
                    "Anthropic",
                    format!(
                        "authentication failed (401): {}",
                        error_response.error.message
                    ),
                ),
                429 => AppError::external_service(
                    "Anthropic",
                    format!("quota or rate limit exceeded: {}", error_response.error.message),
                ),
                _ => AppError::external_service("Anthropic", error_response.error.message),
            },
        )
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> AiProvider {
        AiProvider::Claude
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, messages), fields(model = %model))]
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> AppResult<AiResponse> {
        debug!("Sending messages request to Anthropic");

        let (system, conversation) = Self::convert_messages(messages);

        let request = MessagesRequest {
            model: model.to_owned(),
            max_tokens: MAX_TOKENS,
            system,
            messages: conversation,
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Anthropic API: {}", e);
                AppError::external_service("Anthropic", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Anthropic", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let messages_response: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Anthropic API response: {}", e);
            AppError::external_service("Anthropic", format!("Failed to parse response: {e}"))
        })?;

        let content = messages_response
            .content
            .first()
            .and_then(|block| block.text.clone())
            .ok_or_else(|| AppError::external_service("Anthropic", "API returned no content"))?;

        Ok(AiResponse {
            content,
            metadata: MessageMetadata {
                model: messages_response.model,
                tokens: messages_response.usage.input_tokens
                    + messages_response.usage.output_tokens,
                provider: AiProvider::Claude,
            },
        })
    }
}
