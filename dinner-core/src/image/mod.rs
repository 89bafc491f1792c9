//! Display images for accepted recipes.
//!
//! Lookups go through an [`ImageProvider`] (usually an [`ImageProviderChain`]).
//! Whatever happens upstream, every candidate leaves the [`ImageEnricher`]
//! with an `image_url`: failures and timeouts fall back to a placeholder keyed
//! by the recipe name.

mod dalle;
mod spoonacular;

pub use dalle::DalleImageProvider;
pub use spoonacular::SpoonacularImageProvider;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ImageConfig;
use crate::http::CachingClient;
use crate::types::RecipeCandidate;

/// Placeholder service used when no provider produces an image.
const FALLBACK_BASE: &str = "https://loremflickr.com/800/800";
/// Tags that steer the placeholder service towards plated food.
const FALLBACK_TAGS: &[&str] = &["culinary", "plating", "gourmet", "dish"];
const FALLBACK_SEED_RANGE: u64 = 5000;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected image API response: {0}")]
    BadResponse(String),

    #[error("Image lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can find or make a picture for a recipe.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Image URL for `query`, or `None` when the provider has nothing.
    async fn image_for(&self, query: &str) -> Result<Option<String>, ImageError>;

    fn name(&self) -> &'static str;
}

/// Tries providers in order; the first URL wins.
#[derive(Clone, Default)]
pub struct ImageProviderChain {
    providers: Vec<Arc<dyn ImageProvider>>,
}

impl ImageProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Chain of the providers that have credentials in `config`: DALL-E first,
    /// then Spoonacular search. Empty when neither key is set.
    pub fn from_config(config: &ImageConfig) -> Result<Self, ImageError> {
        let mut chain = Self::new();

        if let Some(key) = &config.openai_api_key {
            chain = chain.with_provider(Arc::new(DalleImageProvider::new(key.clone())?));
        }

        if let Some(key) = &config.spoonacular_api_key {
            let client = CachingClient::builder()
                .cache_dir(config.http_cache_dir.clone())
                .build()
                .map_err(|e| ImageError::RequestFailed(e.to_string()))?;
            chain = chain.with_provider(Arc::new(SpoonacularImageProvider::new(
                Arc::new(client),
                key.clone(),
            )));
        }

        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl ImageProvider for ImageProviderChain {
    async fn image_for(&self, query: &str) -> Result<Option<String>, ImageError> {
        for provider in &self.providers {
            match provider.image_for(query).await {
                Ok(Some(url)) if !url.trim().is_empty() => return Ok(Some(url)),
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), query, "No image found");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), query, error = %e, "Image provider failed");
                }
            }
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

/// Deterministic placeholder image for a recipe name.
///
/// The `lock` seed pins the placeholder service to one picture per name, so
/// the same recipe always gets the same image.
pub fn fallback_image_url(recipe_name: &str) -> String {
    let digest = Sha256::digest(recipe_name.as_bytes());
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    let seed = u64::from_be_bytes(seed_bytes) % FALLBACK_SEED_RANGE;

    let name_tags = recipe_name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| url::form_urlencoded::byte_serialize(w.to_lowercase().as_bytes()).collect::<String>());

    let tags = FALLBACK_TAGS
        .iter()
        .map(|t| t.to_string())
        .chain(name_tags)
        .collect::<Vec<_>>()
        .join(",");

    format!("{FALLBACK_BASE}/{tags}?lock={seed}")
}

/// Attaches an image URL to accepted candidates.
#[derive(Clone)]
pub struct ImageEnricher {
    provider: Arc<dyn ImageProvider>,
    timeout: Duration,
}

impl ImageEnricher {
    pub fn new(provider: Arc<dyn ImageProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Enricher that never calls out and always uses the placeholder.
    pub fn fallback_only() -> Self {
        Self::new(Arc::new(ImageProviderChain::new()), Duration::from_secs(1))
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, ImageError> {
        tokio::time::timeout(self.timeout, self.provider.image_for(query))
            .await
            .map_err(|_| ImageError::Timeout(self.timeout))?
    }

    /// Set `image_url` on one candidate. Never fails.
    pub async fn enrich(&self, mut candidate: RecipeCandidate) -> RecipeCandidate {
        let url = match self.lookup(candidate.image_query()).await {
            Ok(Some(url)) if !url.trim().is_empty() => url,
            Ok(_) => {
                tracing::debug!(recipe = %candidate.name, "No image available, using placeholder");
                fallback_image_url(&candidate.name)
            }
            Err(e) => {
                tracing::warn!(recipe = %candidate.name, error = %e, "Image lookup failed, using placeholder");
                fallback_image_url(&candidate.name)
            }
        };
        candidate.image_url = Some(url);
        candidate
    }

    /// Enrich all candidates concurrently, one task per candidate.
    ///
    /// Output order matches input order. If `cancel` fires, outstanding
    /// lookups are aborted and their candidates get the placeholder.
    pub async fn enrich_all(
        &self,
        candidates: Vec<RecipeCandidate>,
        cancel: &CancellationToken,
    ) -> Vec<RecipeCandidate> {
        let mut slots: Vec<Option<RecipeCandidate>> = vec![None; candidates.len()];
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let enricher = self.clone();
            tasks.spawn(async move { (index, enricher.enrich(candidate).await) });
        }

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, enriched))) => slots[index] = Some(enriched),
                    Some(Err(e)) => tracing::warn!(error = %e, "Image task failed"),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    tracing::info!(pending = tasks.len(), "Image enrichment cancelled");
                    tasks.abort_all();
                    break;
                }
            }
        }

        candidates
            .into_iter()
            .zip(slots)
            .map(|(original, enriched)| {
                enriched.unwrap_or_else(|| {
                    let mut candidate = original;
                    candidate.image_url = Some(fallback_image_url(&candidate.name));
                    candidate
                })
            })
            .collect()
    }
}
