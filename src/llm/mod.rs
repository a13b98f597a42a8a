// ABOUTME: Provider adapter layer - one common message shape mapped to four provider wire formats
// ABOUTME: AiService dispatches by provider tag and builds the summarize/analyze/query prompts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # AI Provider Adapter
//!
//! Normalizes a provider-agnostic message list into each provider's wire
//! format, issues the call over HTTP, and maps the heterogeneous responses
//! back into a single [`AiResponse`] shape. No retries, no circuit breaking;
//! transport and API errors surface directly to the caller.
//!
//! [`AiService`] owns one lazily-constructed client per configured provider
//! and is shared across handlers through `ServerResources`.

mod claude;
mod gemini;
mod lmstudio;
mod openai;
mod prompts;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use lmstudio::LmStudioProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use tracing::{error, instrument};

use crate::config::ProviderKeys;
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, Conversation, Message, MessageMetadata, MessageRole};

/// A single turn in the provider-agnostic request shape
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Speaker role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System instruction turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Normalized provider response
#[derive(Debug, Clone)]
pub struct AiResponse {
    /// Assistant reply text
    pub content: String,
    /// Model, token count, and provider tag for the reply
    pub metadata: MessageMetadata,
}

/// Common interface over the provider wire formats
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider tag
    fn name(&self) -> AiProvider;

    /// Model used when the caller supplies none
    fn default_model(&self) -> &'static str;

    /// Final model name for a request, applying the provider default
    fn resolve_model(&self, requested: Option<&str>) -> String {
        requested.unwrap_or_else(|| self.default_model()).to_owned()
    }

    /// Issue one chat completion
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> AppResult<AiResponse>;
}

/// Dispatches chat requests to whichever providers hold credentials
///
/// Providers without a configured credential stay `None`; requesting one
/// yields a configuration error naming the missing key.
pub struct AiService {
    openai: Option<OpenAiProvider>,
    claude: Option<ClaudeProvider>,
    gemini: Option<GeminiProvider>,
    lmstudio: LmStudioProvider,
}

impl AiService {
    /// Build the service from whichever provider credentials are present
    #[must_use]
    pub fn new(keys: &ProviderKeys) -> Self {
        Self {
            openai: keys.openai_api_key.clone().map(OpenAiProvider::new),
            claude: keys.anthropic_api_key.clone().map(ClaudeProvider::new),
            gemini: keys.google_api_key.clone().map(GeminiProvider::new),
            // LM Studio is a local server and needs no real credential
            lmstudio: LmStudioProvider::new(keys.lm_studio_url.clone()),
        }
    }

    fn provider(&self, provider: AiProvider) -> AppResult<&dyn LlmProvider> {
        match provider {
            AiProvider::Openai => self
                .openai
                .as_ref()
                .map(|p| p as &dyn LlmProvider)
                .ok_or_else(|| AppError::config("OpenAI API key not configured")),
            AiProvider::Claude => self
                .claude
                .as_ref()
                .map(|p| p as &dyn LlmProvider)
                .ok_or_else(|| AppError::config("Anthropic API key not configured")),
            AiProvider::Gemini => self
                .gemini
                .as_ref()
                .map(|p| p as &dyn LlmProvider)
                .ok_or_else(|| AppError::config("Google API key not configured")),
            AiProvider::Lmstudio => Ok(&self.lmstudio),
        }
    }

    /// Send a message list to a provider and get the normalized response
    ///
    /// Applies the provider's default model when the caller supplies none.
    ///
    /// # Errors
    ///
    /// Configuration error when the provider's credential is absent;
    /// external-service error for transport or API failures.
    #[instrument(skip(self, messages), fields(provider = %provider))]
    pub async fn send_message(
        &self,
        provider: AiProvider,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> AppResult<AiResponse> {
        let target = self.provider(provider)?;
        let model = target.resolve_model(model);

        target.complete(messages, &model).await.map_err(|e| {
            error!(provider = %provider, "AI request failed: {}", e.message);
            e
        })
    }

    /// Generate a prose summary of a conversation
    ///
    /// # Errors
    ///
    /// Propagates [`Self::send_message`] errors.
    pub async fn generate_summary(
        &self,
        provider: AiProvider,
        messages: &[Message],
    ) -> AppResult<String> {
        let prompt = prompts::summary_prompt(messages);
        let response = self.send_message(provider, &prompt, None).await?;
        Ok(response.content)
    }

    /// Extract topics, sentiment, key points, and suggested tags
    ///
    /// The model is asked for JSON; its output is parsed best-effort and
    /// wrapped as `{"raw_analysis": ...}` when no JSON object can be
    /// recovered. The parsed object is returned as-is, unvalidated.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::send_message`] errors.
    pub async fn analyze_conversation(
        &self,
        provider: AiProvider,
        messages: &[Message],
    ) -> AppResult<serde_json::Value> {
        let prompt = prompts::analysis_prompt(messages);
        let response = self.send_message(provider, &prompt, None).await?;
        Ok(prompts::extract_json(&response.content))
    }

    /// Answer a natural-language question over past conversations
    ///
    /// # Errors
    ///
    /// Propagates [`Self::send_message`] errors.
    pub async fn query_history(
        &self,
        provider: AiProvider,
        query: &str,
        conversations: &[Conversation],
    ) -> AppResult<String> {
        let prompt = prompts::query_prompt(query, conversations);
        let response = self.send_message(provider, &prompt, None).await?;
        Ok(response.content)
    }
}
