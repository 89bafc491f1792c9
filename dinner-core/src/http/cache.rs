//! Disk-based HTTP response cache.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::cache_key;

/// Disk-based HTTP response cache. One JSON file per URL.
pub struct DiskCache {
    cache_dir: PathBuf,
    max_age: Option<ChronoDuration>,
}

/// A cached successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub body: String,
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub cached_responses: usize,
}

impl DiskCache {
    /// Create a new DiskCache with the given directory. Entries never expire.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            max_age: None,
        }
    }

    /// Treat entries older than `max_age` as missing.
    pub fn with_max_age(mut self, max_age: std::time::Duration) -> Self {
        self.max_age = ChronoDuration::from_std(max_age).ok();
        self
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", cache_key(url)))
    }

    /// Get cached response if it exists and is fresh.
    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        let content = fs::read_to_string(self.entry_path(url)).ok()?;
        let cached: CachedResponse = serde_json::from_str(&content).ok()?;

        if let Some(max_age) = self.max_age {
            if Utc::now() - cached.fetched_at > max_age {
                return None;
            }
        }

        Some(cached)
    }

    /// Save a successful response to the cache.
    pub fn put(&self, url: &str, body: &str, content_type: Option<String>) -> std::io::Result<()> {
        let path = self.entry_path(url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = CachedResponse {
            url: strip_query(url),
            content_type,
            fetched_at: Utc::now(),
            body: body.to_string(),
        };
        let content = serde_json::to_string_pretty(&cached)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(path, content)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        let Ok(hosts) = fs::read_dir(&self.cache_dir) else {
            return stats;
        };

        for host in hosts.filter_map(|e| e.ok()) {
            if let Ok(entries) = fs::read_dir(host.path()) {
                stats.cached_responses += entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count();
            }
        }

        stats
    }

    /// Clear all cached responses.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

/// Query strings may hold API keys, so only the path is persisted.
fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().to_path_buf());
        let url = "https://api.example.com/search?query=pasta&apiKey=secret";

        assert!(cache.get(url).is_none());
        cache
            .put(url, r#"{"results": []}"#, Some("application/json".to_string()))
            .unwrap();

        let cached = cache.get(url).unwrap();
        assert_eq!(cached.body, r#"{"results": []}"#);
        assert_eq!(cached.url, "https://api.example.com/search");
        assert_eq!(cache.stats().cached_responses, 1);

        cache.clear().unwrap();
        assert!(cache.get(url).is_none());
    }

    #[test]
    fn expired_entries_are_misses() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().to_path_buf()).with_max_age(std::time::Duration::ZERO);
        let url = "https://api.example.com/search?query=soup";

        cache.put(url, "{}", None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get(url).is_none());
    }
}
