//! Fake LLM provider for testing.
//!
//! This provider returns deterministic responses, allowing tests to run
//! without network access or API costs. Responses come from an ordered script
//! first (one entry per call), then from substring matches on the prompt.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One scripted reply.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// A fake LLM provider for testing.
#[derive(Debug)]
pub struct FakeProvider {
    /// Replies consumed in order, one per call.
    script: Mutex<VecDeque<Scripted>>,
    /// Prompt substring -> response, checked in insertion order.
    responses: Vec<(String, String)>,
    /// Default response if nothing else applies.
    default_response: Option<String>,
    /// Every prompt received, in call order.
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new().with_default_response("[]")
    }
}

impl FakeProvider {
    /// Create a new FakeProvider with no registered responses.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responses: Vec::new(),
            default_response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Create a FakeProvider that answers successive calls with `replies`.
    pub fn with_script<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for reply in replies {
            provider.push_reply(reply);
        }
        provider
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    /// Queue a reply for the next unscripted call.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_script().push_back(Scripted::Reply(reply.into()));
    }

    /// Queue a request failure for the next unscripted call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_script().push_back(Scripted::Fail(message.into()));
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        if let Some(next) = self.lock_script().pop_front() {
            return match next {
                Scripted::Reply(reply) => Ok(reply),
                Scripted::Fail(message) => Err(LlmError::RequestFailed(message)),
            };
        }

        let prompt_lower = prompt.to_lowercase();
        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
        {
            return Ok(response.clone());
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
