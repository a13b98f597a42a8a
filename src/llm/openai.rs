// ABOUTME: OpenAI chat completions provider
// ABOUTME: Defines the OpenAI-compatible wire types shared with the LM Studio provider
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiResponse, ChatMessage, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, MessageMetadata};

const API_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Sampling temperature applied to every chat request
pub(super) const TEMPERATURE: f32 = 0.7;

// ============================================================================
// Wire Types (OpenAI chat completions format)
// ============================================================================

#[derive(Debug, Serialize)]
pub(super) struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct WireMessage {
    pub role: String,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionUsage {
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map an OpenAI-format error body to an application error
///
/// Provider-side auth failures stay external-service errors so the caller
/// never sees a 401 for a server-side credential problem.
pub(super) fn parse_error_response(
    service: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> AppError {
    serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
        |_| {
            AppError::external_service(
                service,
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        },
        |error_response| match status.as_u16() {
            401 => AppError::external_service(
                service,
                format!("authentication failed (401): {}", error_response.error.message),
            ),
            429 => AppError::external_service(
                service,
                format!("quota or rate limit exceeded: {}", error_response.error.message),
            ),
            _ => AppError::external_service(service, error_response.error.message),
        },
    )
}

/// Convert the provider-agnostic message list to the wire format
pub(super) fn convert_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
    messages.iter().map(WireMessage::from).collect()
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
}

impl OpenAiProvider {
    /// Create a provider with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> AiProvider {
        AiProvider::Openai
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, messages), fields(model = %model))]
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> AppResult<AiResponse> {
        debug!("Sending chat completion request to OpenAI");

        let request = CompletionRequest {
            model: model.to_owned(),
            messages: convert_messages(messages),
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{API_BASE_URL}/chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to OpenAI API: {}", e);
                AppError::external_service("OpenAI", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("OpenAI", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(parse_error_response("OpenAI", status, &body));
        }

        let completion: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse OpenAI API response: {}", e);
            AppError::external_service("OpenAI", format!("Failed to parse response: {e}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("OpenAI", "API returned no choices"))?;

        Ok(AiResponse {
            content: choice.message.content.unwrap_or_default(),
            metadata: MessageMetadata {
                model: completion.model.unwrap_or_else(|| model.to_owned()),
                tokens: completion.usage.map_or(0, |u| u.total_tokens),
                provider: AiProvider::Openai,
            },
        })
    }
}
