// ABOUTME: Google Gemini generateContent provider
// ABOUTME: Renames roles to Gemini's user/model pair and wraps content in text parts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiResponse, ChatMessage, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, MessageMetadata, MessageRole};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
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

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    /// Create a provider with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Convert to Gemini's two-role format: assistant turns become
    /// `model`, everything else (user and system alike) becomes `user`
    fn convert_messages(messages: &[ChatMessage]) -> Vec<Content> {
        messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    MessageRole::Assistant => "model".to_owned(),
                    MessageRole::User | MessageRole::System => "user".to_owned(),
                },
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
            |_| {
                AppError::external_service(
                    "Gemini",
                    format!(
                        "API error ({}): {}",
                        status,
                        body.chars().take(200).collect::<String>()
                    ),
                )
            },
            |error_response| match status.as_u16() {
                401 | 403 => AppError::external_service(
                    "Gemini",
                    format!(
                        "authentication failed (401): {}",
                        error_response.error.message
                    ),
                ),
                429 => AppError::external_service(
                    "Gemini",
                    format!("quota or rate limit exceeded: {}", error_response.error.message),
                ),
                _ => AppError::external_service("Gemini", error_response.error.message),
            },
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> AiProvider {
        AiProvider::Gemini
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    /// A requested model whose name contains `gpt` is someone else's
    /// naming convention leaking through a stale client default; swap it
    /// for the Gemini default instead of letting the API reject it.
    fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested {
            Some(model) if !model.contains("gpt") => model.to_owned(),
            _ => DEFAULT_MODEL.to_owned(),
        }
    }

    #[instrument(skip(self, messages), fields(model = %model))]
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> AppResult<AiResponse> {
        debug!("Sending generateContent request to Gemini");

        let request = GenerateContentRequest {
            contents: Self::convert_messages(messages),
        };

        let url = format!(
            "{API_BASE_URL}/models/{model}:generateContent?key={}",
            self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Failed to send request to Gemini API: {}", e);
            AppError::external_service("Gemini", format!("Failed to connect: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Gemini", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let content_response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse Gemini API response: {}", e);
                AppError::external_service("Gemini", format!("Failed to parse response: {e}"))
            })?;

        let content = content_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::external_service("Gemini", "API returned no candidates"))?;

        Ok(AiResponse {
            content,
            metadata: MessageMetadata {
                model: model.to_owned(),
                // Gemini does not report usage in a comparable shape
                tokens: 0,
                provider: AiProvider::Gemini,
            },
        })
    }
}
