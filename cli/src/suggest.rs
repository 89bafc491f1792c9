use anyhow::{Context, Result};
use dinner_core::{
    create_provider, HttpPantry, ImageConfig, ImageEnricher, ImageProviderChain, LlmConfig,
    LlmRecipeGenerator, PantryProvider, RecipeSuggester, StaticPantry, SuggestConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct SuggestArgs {
    pub pantry: Option<PathBuf>,
    pub pantry_url: Option<String>,
    pub user: String,
    pub count: usize,
    pub restrictions: Vec<String>,
    pub no_images: bool,
}

pub async fn suggest(args: SuggestArgs) -> Result<()> {
    let config = SuggestConfig::from_env();
    let llm_config = LlmConfig::from_env().context("LLM configuration")?;

    let provider = create_provider(&llm_config)?;
    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Using LLM provider"
    );
    let generator = Arc::new(LlmRecipeGenerator::new(provider));

    let pantry: Arc<dyn PantryProvider> = match (&args.pantry, &args.pantry_url) {
        (Some(path), _) => Arc::new(
            StaticPantry::from_json_file(path)
                .with_context(|| format!("loading pantry from {}", path.display()))?,
        ),
        (None, Some(url)) => Arc::new(HttpPantry::new(url.clone(), config.pantry_timeout)?),
        (None, None) => anyhow::bail!("either --pantry or --pantry-url is required"),
    };

    let enricher = if args.no_images {
        ImageEnricher::fallback_only()
    } else {
        let chain = ImageProviderChain::from_config(&ImageConfig::from_env())?;
        if chain.is_empty() {
            tracing::info!("No image API keys set, using placeholder images");
        }
        ImageEnricher::new(Arc::new(chain), config.image_timeout)
    };

    let suggester = RecipeSuggester::new(config, pantry, generator, enricher);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let allergen_override = (!args.restrictions.is_empty()).then_some(args.restrictions);
    let suggestions = suggester
        .get_suggestions(&args.user, args.count, allergen_override, &cancel)
        .await?;

    if suggestions.is_partial() {
        tracing::warn!(
            found = suggestions.recipes.len(),
            requested = suggestions.requested,
            "Fewer recipes than requested; try again for more"
        );
    }

    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}
