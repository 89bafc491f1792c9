//! Configuration objects, loaded from environment variables.
//!
//! Everything is built once at startup and handed to the components that need
//! it. Nothing here is global.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default OpenRouter base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model for the OpenRouter provider.
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-001";

/// Default model for the Claude provider.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Default delay between LLM requests in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 500;

/// Generation rounds before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Upper bound for the number of recipes in one request.
pub const DEFAULT_MAX_COUNT: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

/// Knobs for the suggestion loop.
#[derive(Debug, Clone)]
pub struct SuggestConfig {
    /// Generation rounds per request.
    pub max_attempts: u32,
    /// Requests for more than this many recipes are clamped.
    pub max_count: usize,
    /// Per-round deadline for the model call.
    pub generation_timeout: Duration,
    /// Per-candidate deadline for the image lookup.
    pub image_timeout: Duration,
    /// Deadline for each pantry provider call.
    pub pantry_timeout: Duration,
    /// Also reject candidates containing ingredients excluded by the user's
    /// dietary restrictions.
    pub strict_restrictions: bool,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_count: DEFAULT_MAX_COUNT,
            generation_timeout: Duration::from_secs(60),
            image_timeout: Duration::from_secs(15),
            pantry_timeout: Duration::from_secs(10),
            strict_restrictions: true,
        }
    }
}

impl SuggestConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// - `DINNER_MAX_ATTEMPTS`
    /// - `DINNER_GENERATION_TIMEOUT_SECS`
    /// - `DINNER_IMAGE_TIMEOUT_SECS`
    /// - `DINNER_PANTRY_TIMEOUT_SECS`
    /// - `DINNER_STRICT_RESTRICTIONS` ("false" or "0" disables)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_attempts: env_parse("DINNER_MAX_ATTEMPTS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            max_count: defaults.max_count,
            generation_timeout: env_parse("DINNER_GENERATION_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            image_timeout: env_parse("DINNER_IMAGE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.image_timeout),
            pantry_timeout: env_parse("DINNER_PANTRY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pantry_timeout),
            strict_restrictions: env::var("DINNER_STRICT_RESTRICTIONS")
                .map(|v| !(v == "false" || v == "0"))
                .unwrap_or(defaults.strict_restrictions),
        }
    }

    /// Clamp a requested recipe count into `1..=max_count`.
    pub fn clamp_count(&self, count: usize) -> usize {
        count.clamp(1, self.max_count.max(1))
    }
}

/// Which generative model backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    OpenRouter,
    Claude,
    Fake,
}

impl LlmProviderKind {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "openrouter" => Ok(Self::OpenRouter),
            "claude" => Ok(Self::Claude),
            "fake" => Ok(Self::Fake),
            other => Err(ConfigError::Invalid {
                name: "DINNER_LLM_PROVIDER".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Generative model configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// API key for the selected provider. Empty for the fake provider.
    pub api_key: String,
    /// Model name (e.g., "google/gemini-2.0-flash-001", "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for OpenAI-compatible APIs.
    pub base_url: String,
    /// Milliseconds to wait between requests.
    pub rate_limit_ms: u64,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DINNER_LLM_PROVIDER`: "openrouter" (default), "claude" or "fake"
    /// - `OPENROUTER_API_KEY` / `ANTHROPIC_API_KEY`: required for the matching provider
    /// - `DINNER_LLM_MODEL`: model name override
    /// - `DINNER_LLM_BASE_URL`: API base URL (default: "https://openrouter.ai/api/v1")
    /// - `DINNER_LLM_RATE_LIMIT_MS`: rate limit in ms (default: 500)
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = LlmProviderKind::parse(
            &env::var("DINNER_LLM_PROVIDER").unwrap_or_else(|_| "openrouter".to_string()),
        )?;

        let (api_key, default_model) = match provider {
            LlmProviderKind::OpenRouter => (
                required_env("OPENROUTER_API_KEY")?,
                DEFAULT_OPENROUTER_MODEL,
            ),
            LlmProviderKind::Claude => (required_env("ANTHROPIC_API_KEY")?, DEFAULT_CLAUDE_MODEL),
            LlmProviderKind::Fake => (String::new(), "fake-model"),
        };

        let model = env::var("DINNER_LLM_MODEL").unwrap_or_else(|_| default_model.to_string());

        let base_url =
            env::var("DINNER_LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let rate_limit_ms = env_parse("DINNER_LLM_RATE_LIMIT_MS").unwrap_or(DEFAULT_RATE_LIMIT_MS);

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            rate_limit_ms,
        })
    }
}

/// Image provider configuration. Providers without a key are skipped; the
/// placeholder fallback is always available.
#[derive(Debug, Clone, Default)]
pub struct ImageConfig {
    pub openai_api_key: Option<String>,
    pub spoonacular_api_key: Option<String>,
    /// Disk cache for image search responses. `None` disables caching.
    pub http_cache_dir: Option<PathBuf>,
}

impl ImageConfig {
    /// Load from `OPENAI_API_KEY`, `SPOONACULAR_API_KEY` and `DINNER_HTTP_CACHE`
    /// ("none" disables, any other value is a directory).
    pub fn from_env() -> Self {
        let http_cache_dir = match env::var("DINNER_HTTP_CACHE").ok() {
            Some(val) if val == "none" => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(Self::default_cache_dir()),
        };

        Self {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            spoonacular_api_key: optional_env("SPOONACULAR_API_KEY"),
            http_cache_dir,
        }
    }

    /// Get the default cache directory: ~/.dinner/http-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".dinner").join("http-cache"))
            .unwrap_or_else(|| PathBuf::from("data/http-cache"))
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Read a variable, stripping stray quotes that sometimes end up in `.env` files.
fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
