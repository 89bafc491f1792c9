//! OpenAI image generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ImageError, ImageProvider};

const GENERATIONS_URL: &str = "https://api.openai.com/v1/images/generations";
const MODEL: &str = "dall-e-3";

/// Prompt for a plated, home-cooked photo of `recipe`.
pub fn food_photo_prompt(recipe: &str) -> String {
    format!(
        "Professional food photograph of \"{recipe}\", centered in frame on a simple plate or bowl. \
         Top-down or slight angle view, the food fills the frame. Home-cooked appearance, \
         neutral or wooden table, soft natural lighting, shallow depth of field. \
         No text, logos or watermarks."
    )
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u8,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

/// DALL-E 3 provider. Slow and paid, so it sits first in the chain only when
/// a key is configured.
#[derive(Debug)]
pub struct DalleImageProvider {
    api_key: String,
    client: reqwest::Client,
}

impl DalleImageProvider {
    pub fn new(api_key: String) -> Result<Self, ImageError> {
        Ok(Self {
            api_key,
            client: reqwest::Client::builder()
                .build()
                .map_err(|e| ImageError::RequestFailed(e.to_string()))?,
        })
    }

    fn first_url(body: &str) -> Result<Option<String>, ImageError> {
        let response: GenerationResponse =
            serde_json::from_str(body).map_err(|e| ImageError::BadResponse(e.to_string()))?;
        Ok(response.data.into_iter().find_map(|image| image.url))
    }
}

#[async_trait]
impl ImageProvider for DalleImageProvider {
    async fn image_for(&self, query: &str) -> Result<Option<String>, ImageError> {
        let request = GenerationRequest {
            model: MODEL,
            prompt: food_photo_prompt(query),
            n: 1,
            size: "1024x1024",
            quality: "standard",
            style: "natural",
        };

        let response = self
            .client
            .post(GENERATIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImageError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(ImageError::BadResponse(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        Self::first_url(&body)
    }

    fn name(&self) -> &'static str {
        "dalle"
    }
}
