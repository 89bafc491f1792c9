//! OpenRouter provider (OpenAI-compatible chat completions API).

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{LlmError, LlmProvider};
use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str =
    "You are a home-cooking recipe author. You follow ingredient constraints exactly and answer in JSON only.";

/// LLM provider talking to OpenRouter, with a minimum interval between requests.
pub struct OpenRouterProvider {
    client: Client<OpenAIConfig>,
    model: String,
    min_interval: Duration,
    temperature: f32,
    last_request: Mutex<Option<Instant>>,
}

impl fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("model", &self.model)
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

impl OpenRouterProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: &LlmConfig) -> Self {
        // Point async-openai at OpenRouter
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            min_interval: Duration::from_millis(config.rate_limit_ms),
            temperature: 0.7,
            last_request: Mutex::new(None),
        }
    }

    /// Apply rate limiting between requests.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    fn build_messages(prompt: &str) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build system message: {}", e)))?;

        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build user message: {}", e)))?;

        Ok(vec![system.into(), user.into()])
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.rate_limit().await;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(prompt)?)
            .max_completion_tokens(8192u32)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        tracing::debug!(model = %self.model, "Calling OpenRouter");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenRouter usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No content in completion".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
