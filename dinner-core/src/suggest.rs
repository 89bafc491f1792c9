//! The suggestion loop.
//!
//! Rounds run one after another because each prompt depends on what the
//! previous round got wrong. Every round asks only for the shortfall, drops
//! duplicate names, validates what is left and feeds offending ingredients
//! back into the next prompt as forbidden. The loop ends when enough recipes
//! are accepted or the attempt budget is spent.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SuggestConfig;
use crate::error::SuggestError;
use crate::generate::{CandidateGenerator, GenerateError, GenerationRequest};
use crate::llm::LlmError;
use crate::image::ImageEnricher;
use crate::pantry::{PantryError, PantryProvider};
use crate::types::{RecipeCandidate, Suggestions};
use crate::validate::{Validator, Verdict};

/// What the loop produced before images are attached.
#[derive(Debug, Clone, Default)]
pub struct CollectOutcome {
    /// Validated candidates in acceptance order, without images.
    pub accepted: Vec<RecipeCandidate>,
    /// Rounds run, including failed ones.
    pub attempts: u32,
    /// Every ingredient that sank a candidate, normalized.
    pub forbidden: BTreeSet<String>,
}

pub struct RecipeSuggester {
    config: SuggestConfig,
    pantry: Arc<dyn PantryProvider>,
    generator: Arc<dyn CandidateGenerator>,
    enricher: ImageEnricher,
}

impl RecipeSuggester {
    pub fn new(
        config: SuggestConfig,
        pantry: Arc<dyn PantryProvider>,
        generator: Arc<dyn CandidateGenerator>,
        enricher: ImageEnricher,
    ) -> Self {
        Self {
            config,
            pantry,
            generator,
            enricher,
        }
    }

    pub fn config(&self) -> &SuggestConfig {
        &self.config
    }

    /// Suggest up to `count` dinners for `user_id`, each with an image.
    ///
    /// `count` is clamped to `1..=max_count`. `allergen_override` replaces the
    /// user's stored restrictions. Fewer than `count` recipes is a normal,
    /// partial result; zero is [`SuggestError::NoValidRecipe`].
    pub async fn get_suggestions(
        &self,
        user_id: &str,
        count: usize,
        allergen_override: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> Result<Suggestions, SuggestError> {
        let requested = self.config.clamp_count(count);
        if cancel.is_cancelled() {
            return Err(SuggestError::Cancelled);
        }

        let (available, restrictions) = match allergen_override {
            Some(overridden) => {
                let available = self.load_available(user_id).await;
                let overridden = overridden
                    .into_iter()
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
                (available, overridden)
            }
            None => tokio::join!(
                self.load_available(user_id),
                self.load_restrictions(user_id)
            ),
        };

        tracing::info!(
            user_id,
            requested,
            available = available.len(),
            restrictions = ?restrictions,
            "Collecting dinner suggestions"
        );

        let outcome = self
            .collect_candidates(&available, &restrictions, requested, cancel)
            .await?;

        if outcome.accepted.is_empty() {
            tracing::info!(attempts = outcome.attempts, "No valid recipe for this inventory");
            return Err(SuggestError::NoValidRecipe {
                attempts: outcome.attempts,
            });
        }

        let recipes = self.enricher.enrich_all(outcome.accepted, cancel).await;
        if cancel.is_cancelled() {
            return Err(SuggestError::Cancelled);
        }

        let suggestions = Suggestions {
            recipes,
            requested,
            attempts: outcome.attempts,
        };
        if suggestions.is_partial() {
            tracing::info!(
                found = suggestions.recipes.len(),
                requested,
                attempts = suggestions.attempts,
                "Returning partial suggestions"
            );
        }

        Ok(suggestions)
    }

    /// Run generation rounds until `count` candidates pass validation or the
    /// attempt budget runs out.
    ///
    /// Exhaustion is not an error; the outcome simply holds fewer candidates
    /// (possibly none). Only cancellation fails.
    pub async fn collect_candidates(
        &self,
        available: &[String],
        restrictions: &[String],
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<CollectOutcome, SuggestError> {
        let count = count.max(1);
        let validator = Validator::new(available, restrictions, self.config.strict_restrictions);

        let mut outcome = CollectOutcome::default();
        let mut accepted_names: HashSet<String> = HashSet::new();

        while outcome.accepted.len() < count && outcome.attempts < self.config.max_attempts {
            if cancel.is_cancelled() {
                return Err(SuggestError::Cancelled);
            }

            outcome.attempts += 1;
            let shortfall = count - outcome.accepted.len();
            let request = GenerationRequest {
                available: available.to_vec(),
                restrictions: restrictions.to_vec(),
                count: shortfall,
                forbidden: outcome.forbidden.iter().cloned().collect(),
            };

            let span = tracing::info_span!("generation_round", round = outcome.attempts, shortfall);
            async {
                let candidates = match self.generate_round(&request, cancel).await? {
                    Some(candidates) => candidates,
                    None => return Ok(()),
                };
                tracing::debug!(candidates = candidates.len(), "Round produced candidates");

                for candidate in candidates {
                    if outcome.accepted.len() >= count {
                        break;
                    }

                    let key = candidate.name_key();
                    if accepted_names.contains(&key) {
                        tracing::debug!(recipe = %candidate.name, "Dropping duplicate recipe");
                        continue;
                    }

                    match validator.check(&candidate) {
                        Verdict::Accepted => {
                            tracing::info!(recipe = %candidate.name, "Accepted recipe");
                            accepted_names.insert(key);
                            outcome.accepted.push(candidate);
                        }
                        Verdict::Rejected { ingredient, reason } => {
                            tracing::info!(
                                recipe = %candidate.name,
                                ingredient = %ingredient,
                                reason = ?reason,
                                "Rejected recipe"
                            );
                            outcome.forbidden.insert(ingredient);
                        }
                    }
                }

                Ok::<(), SuggestError>(())
            }
            .instrument(span)
            .await?;
        }

        Ok(outcome)
    }

    /// One model call with its deadline. `Ok(None)` means the round failed and
    /// only costs its attempt.
    async fn generate_round(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<RecipeCandidate>>, SuggestError> {
        let timeout = self.config.generation_timeout;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SuggestError::Cancelled),
            result = tokio::time::timeout(timeout, self.generator.generate(request)) => {
                let result = result.unwrap_or(Err(GenerateError::Llm(LlmError::Timeout(timeout))));
                match result {
                    Ok(candidates) => Ok(Some(candidates)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Generation round failed");
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn load_available(&self, user_id: &str) -> Vec<String> {
        with_deadline(
            "inventory",
            self.config.pantry_timeout,
            self.pantry.available_ingredients(user_id),
        )
        .await
    }

    async fn load_restrictions(&self, user_id: &str) -> Vec<String> {
        with_deadline(
            "restrictions",
            self.config.pantry_timeout,
            self.pantry.dietary_restrictions(user_id),
        )
        .await
    }
}

/// Await a pantry call, degrading to an empty list on error or timeout.
async fn with_deadline<F>(what: &'static str, timeout: Duration, call: F) -> Vec<String>
where
    F: Future<Output = Result<Vec<String>, PantryError>>,
{
    let result = tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(PantryError::Timeout(timeout)));

    result.unwrap_or_else(|e| {
        tracing::warn!(what, error = %e, "Pantry unavailable, continuing with empty list");
        Vec::new()
    })
}
