//! LLM provider abstraction for recipe generation.
//!
//! This module provides a trait-based abstraction over the generative model
//! backends (OpenRouter, Claude) plus a scripted fake for tests.

mod claude;
mod fake;
mod openrouter;

pub use claude::ClaudeProvider;
pub use fake::FakeProvider;
pub use openrouter::OpenRouterProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{LlmConfig, LlmProviderKind};

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. The provider is responsible
/// for making API calls and returning the model's raw text response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt to the LLM and get a text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "claude", "openrouter", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "claude-sonnet-4-20250514").
    fn model_name(&self) -> &str;
}

/// Build the provider selected by `config`.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        LlmProviderKind::Fake => Ok(Arc::new(FakeProvider::default())),
        LlmProviderKind::Claude => {
            if config.api_key.is_empty() {
                return Err(LlmError::NotConfigured(
                    "ANTHROPIC_API_KEY not set".to_string(),
                ));
            }
            Ok(Arc::new(ClaudeProvider::new(
                config.api_key.clone(),
                config.model.clone(),
            )))
        }
        LlmProviderKind::OpenRouter => {
            if config.api_key.is_empty() {
                return Err(LlmError::NotConfigured(
                    "OPENROUTER_API_KEY not set".to_string(),
                ));
            }
            Ok(Arc::new(OpenRouterProvider::new(config)))
        }
    }
}
