//! Recipe candidate generation.
//!
//! Turns (pantry, restrictions, shortfall, forbidden ingredients) into a prompt,
//! sends it to the configured model and decodes the reply into candidates.

mod parse;
mod prompt;

pub use parse::{parse_candidates, strip_code_fence, ParseError};
pub use prompt::render_generation_prompt;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::llm::{LlmError, LlmProvider};
use crate::types::RecipeCandidate;

/// Why a generation round produced nothing usable.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not decode model response: {0}")]
    Parse(#[from] ParseError),
}

/// Inputs for one generation round.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub available: Vec<String>,
    pub restrictions: Vec<String>,
    /// How many recipes to ask for (the shortfall, never the original count).
    pub count: usize,
    /// Ingredients that sank candidates in earlier rounds.
    pub forbidden: Vec<String>,
}

/// Anything that can produce recipe candidates for a round.
///
/// The orchestrator only sees this trait, so tests can drive it with
/// hand-written generators instead of a model.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RecipeCandidate>, GenerateError>;
}

/// Generator backed by an [`LlmProvider`].
#[derive(Debug, Clone)]
pub struct LlmRecipeGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl LlmRecipeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Provenance tag stamped on every candidate, e.g. "ai:openrouter".
    pub fn source_tag(&self) -> String {
        format!("ai:{}", self.provider.provider_name())
    }
}

#[async_trait]
impl CandidateGenerator for LlmRecipeGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RecipeCandidate>, GenerateError> {
        let prompt = render_generation_prompt(
            &request.available,
            &request.restrictions,
            request.count.max(1),
            &request.forbidden,
        );

        tracing::debug!(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            count = request.count,
            forbidden = request.forbidden.len(),
            "Requesting recipes"
        );

        let raw = self.provider.complete(&prompt).await?;
        let candidates = parse_candidates(&raw, &self.source_tag())?;

        tracing::debug!(parsed = candidates.len(), "Decoded model response");
        Ok(candidates)
    }
}
