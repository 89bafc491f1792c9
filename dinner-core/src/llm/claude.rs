//! Claude (Anthropic) LLM provider.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str =
    "You are a home-cooking recipe author. You follow ingredient constraints exactly and answer in JSON only.";

/// Claude API provider.
#[derive(Debug)]
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl ClaudeProvider {
    /// Create a new ClaudeProvider with the given API key and model.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.7,
            client: reqwest::Client::new(),
        }
    }

    /// Override the sampling temperature (default 0.7).
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Pull the first text block out of a messages API response body.
    fn extract_text(body: &str) -> Result<String, LlmError> {
        let response: MessagesResponse =
            serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;

        response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .find_map(|block| block.text)
            .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))
    }

    fn error_from_body(status: u16, body: String) -> LlmError {
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => LlmError::ApiError {
                status,
                message: format!("{}: {}", envelope.error.kind, envelope.error.message),
            },
            Err(_) => LlmError::ApiError {
                status,
                message: body,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 8192,
            temperature: self.temperature,
            system: SYSTEM_PROMPT,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), body));
        }

        Self::extract_text(&body)
    }

    fn provider_name(&self) -> &'static str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_skips_non_text_blocks() {
        let body = r#"{"content": [
            {"type": "thinking", "text": null},
            {"type": "text", "text": "[{\"name\": \"Omelette\"}]"}
        ]}"#;
        let text = ClaudeProvider::extract_text(body).unwrap();
        assert!(text.contains("Omelette"));
    }

    #[test]
    fn test_extract_text_without_text_block() {
        let body = r#"{"content": []}"#;
        assert!(matches!(
            ClaudeProvider::extract_text(body),
            Err(LlmError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_from_body() {
        let body = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        match ClaudeProvider::error_from_body(529, body.to_string()) {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 529);
                assert_eq!(message, "overloaded_error: Overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match ClaudeProvider::error_from_body(500, "gateway down".to_string()) {
            LlmError::ApiError { message, .. } => assert_eq!(message, "gateway down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
