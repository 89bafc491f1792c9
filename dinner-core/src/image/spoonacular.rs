//! Spoonacular recipe search as an image source.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{ImageError, ImageProvider};
use crate::http::HttpClient;

const SEARCH_URL: &str = "https://api.spoonacular.com/recipes/complexSearch";

/// Words that only make the search worse.
const NOISE_WORDS: &[&str] = &["recipe", "dinner"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    image: Option<String>,
}

/// Finds the picture of the closest published recipe.
pub struct SpoonacularImageProvider {
    client: Arc<dyn HttpClient>,
    api_key: String,
}

impl SpoonacularImageProvider {
    pub fn new(client: Arc<dyn HttpClient>, api_key: String) -> Self {
        Self { client, api_key }
    }

    /// Full query first, then its first three meaningful words when it is longer.
    pub fn search_queries(query: &str) -> Vec<String> {
        let mut queries = vec![query.trim().to_string()];

        let words: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|w| !NOISE_WORDS.contains(&w.as_str()))
            .collect();
        if words.len() > 2 {
            let short = words[..3].join(" ");
            if short != queries[0].to_lowercase() {
                queries.push(short);
            }
        }

        queries
    }

    fn search_url(&self, query: &str) -> Result<String, ImageError> {
        url::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("query", query),
                ("number", "1"),
                ("type", "main course"),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| ImageError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl ImageProvider for SpoonacularImageProvider {
    async fn image_for(&self, query: &str) -> Result<Option<String>, ImageError> {
        for q in Self::search_queries(query) {
            let body = self
                .client
                .fetch_text(&self.search_url(&q)?)
                .await
                .map_err(|e| ImageError::RequestFailed(e.to_string()))?;

            let response: SearchResponse =
                serde_json::from_str(&body).map_err(|e| ImageError::BadResponse(e.to_string()))?;

            if let Some(image) = response.results.into_iter().find_map(|r| r.image) {
                return Ok(Some(image));
            }
        }

        Ok(None)
    }

    fn name(&self) -> &'static str {
        "spoonacular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    fn provider(client: MockClient) -> SpoonacularImageProvider {
        SpoonacularImageProvider::new(Arc::new(client), "secret".to_string())
    }

    #[test]
    fn test_search_queries() {
        assert_eq!(
            SpoonacularImageProvider::search_queries("Creamy Garlic Chicken Pasta Dinner"),
            vec!["Creamy Garlic Chicken Pasta Dinner", "creamy garlic chicken"]
        );
        assert_eq!(
            SpoonacularImageProvider::search_queries("Bean Stew"),
            vec!["Bean Stew"]
        );
        assert_eq!(
            SpoonacularImageProvider::search_queries("easy recipe rice bowl"),
            vec!["easy recipe rice bowl", "easy rice bowl"]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_short_query() {
        let p = provider(MockClient::new());
        let full = p.search_url("Creamy Garlic Chicken Pasta").unwrap();
        let short = p.search_url("creamy garlic chicken").unwrap();

        let client = MockClient::new()
            .with_text(&full, r#"{"results": []}"#)
            .with_text(&short, r#"{"results": [{"id": 1, "image": "https://img.spoonacular.com/1.jpg"}]}"#);

        let url = provider(client)
            .image_for("Creamy Garlic Chicken Pasta")
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://img.spoonacular.com/1.jpg"));
    }

    #[tokio::test]
    async fn test_no_results() {
        let client = MockClient::new().with_text(SEARCH_URL, r#"{"results": []}"#);
        assert!(provider(client).image_for("Bean Stew").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let client = MockClient::new().with_error(SEARCH_URL, "quota exceeded");
        assert!(matches!(
            provider(client).image_for("Bean Stew").await,
            Err(ImageError::RequestFailed(_))
        ));
    }
}
