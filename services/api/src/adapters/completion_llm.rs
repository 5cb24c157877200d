//! services/api/src/adapters/completion_llm.rs
//!
//! Text completion backed by the OpenAI chat API. Implements the
//! `CompletionService` port used for petition improvement, summaries and the
//! opportunity narrative.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use lpms_core::ports::{CompletionService, ExternalServiceError};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletionAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ExternalServiceError> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ExternalServiceError::Request(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(max_tokens)
            .n(1)
            .build()
            .map_err(|e| ExternalServiceError::Request(e.to_string()))?;

        debug!("Sending completion request to model {}", self.model);
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| ExternalServiceError::Request(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                ExternalServiceError::InvalidResponse("no content in completion".to_string())
            })
    }
}

/// Used when no API key is configured. Every call fails with `NotConfigured`,
/// so callers apply their fallbacks.
#[derive(Clone, Copy, Default)]
pub struct DisabledCompletion;

#[async_trait]
impl CompletionService for DisabledCompletion {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ExternalServiceError> {
        Err(ExternalServiceError::NotConfigured)
    }
}
