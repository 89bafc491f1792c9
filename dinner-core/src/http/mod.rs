//! HTTP client with disk caching and rate limiting.
//!
//! Used for third-party lookups (image search) where repeated queries for the
//! same recipe name should not burn API quota.

mod cache;
mod client;
mod rate_limiter;

pub use cache::{CacheStats, CachedResponse, DiskCache};
pub use client::{CachingClient, CachingClientBuilder, HttpClient, MockClient, MockResponse};
pub use rate_limiter::RateLimiter;

use sha2::{Digest, Sha256};

/// Query parameters that carry credentials and must never reach a cache key.
const SECRET_PARAMS: &[&str] = &["apikey", "api_key", "key", "token", "access_token"];

/// Stable cache key for a URL: host plus a hash of the URL with credentials removed.
/// e.g., "https://api.spoonacular.com/recipes/complexSearch?query=soup&apiKey=x"
/// -> "api-spoonacular-com/4f0c...".
pub fn cache_key(url: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(p) => p,
        Err(_) => return format!("invalid/{}", hash_hex(url)),
    };

    let host = parsed
        .host_str()
        .unwrap_or("unknown")
        .trim_start_matches("www.")
        .replace('.', "-");

    let mut keyed = parsed.clone();
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !SECRET_PARAMS.contains(&k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        keyed.set_query(None);
    } else {
        keyed.query_pairs_mut().clear().extend_pairs(kept);
    }

    format!("{}/{}", host, hash_hex(keyed.as_str()))
}

fn hash_hex(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    // 16 bytes (32 hex chars) keeps filenames short
    hex::encode(&digest[..16])
}
