pub mod config;
pub mod error;
pub mod generate;
pub mod http;
pub mod image;
pub mod llm;
pub mod pantry;
pub mod restrictions;
pub mod suggest;
pub mod types;
pub mod validate;

pub use config::{ConfigError, ImageConfig, LlmConfig, LlmProviderKind, SuggestConfig};
pub use error::{FetchError, SuggestError};
pub use generate::{CandidateGenerator, GenerateError, GenerationRequest, LlmRecipeGenerator};
pub use http::{
    CacheStats, CachingClient, CachingClientBuilder, DiskCache, HttpClient, MockClient,
    MockResponse,
};
pub use image::{
    fallback_image_url, DalleImageProvider, ImageEnricher, ImageError, ImageProvider,
    ImageProviderChain, SpoonacularImageProvider,
};
pub use llm::{create_provider, LlmError, LlmProvider};
pub use pantry::{flatten_inventory, HttpPantry, PantryError, PantryProvider, StaticPantry};
pub use suggest::{CollectOutcome, RecipeSuggester};
pub use types::{InventoryItem, Macros, RecipeCandidate, RecipeIngredient, Suggestions};
pub use validate::{validate, RejectReason, Validator, Verdict, STAPLES};
