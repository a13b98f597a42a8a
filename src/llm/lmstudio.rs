// ABOUTME: LM Studio provider - OpenAI-compatible API served by a local model runner
// ABOUTME: Reuses the OpenAI wire types against a configurable base URL with a placeholder key
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument};

use super::openai::{convert_messages, parse_error_response, CompletionRequest, CompletionResponse, TEMPERATURE};
use super::{AiResponse, ChatMessage, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, MessageMetadata};

const DEFAULT_MODEL: &str = "local-model";

/// LM Studio accepts any key; this placeholder keeps the header present
const PLACEHOLDER_API_KEY: &str = "lm-studio";

/// Local LM Studio server speaking the OpenAI chat completions format
pub struct LmStudioProvider {
    client: Client,
    base_url: String,
}

impl LmStudioProvider {
    /// Create a provider targeting the given base URL
    /// (e.g. `http://localhost:1234/v1`)
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl LlmProvider for LmStudioProvider {
    fn name(&self) -> AiProvider {
        AiProvider::Lmstudio
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, messages), fields(model = %model))]
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> AppResult<AiResponse> {
        debug!("Sending chat completion request to LM Studio at {}", self.base_url);

        let request = CompletionRequest {
            model: model.to_owned(),
            messages: convert_messages(messages),
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {PLACEHOLDER_API_KEY}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach LM Studio: {}", e);
                AppError::external_service(
                    "LM Studio",
                    format!("Failed to connect (is the local server running?): {e}"),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("LM Studio", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(parse_error_response("LM Studio", status, &body));
        }

        let completion: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse LM Studio response: {}", e);
            AppError::external_service("LM Studio", format!("Failed to parse response: {e}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("LM Studio", "API returned no choices"))?;

        Ok(AiResponse {
            content: choice.message.content.unwrap_or_default(),
            metadata: MessageMetadata {
                model: completion.model.unwrap_or_else(|| model.to_owned()),
                // Local servers often omit usage accounting
                tokens: completion.usage.map_or(0, |u| u.total_tokens),
                provider: AiProvider::Lmstudio,
            },
        })
    }
}
