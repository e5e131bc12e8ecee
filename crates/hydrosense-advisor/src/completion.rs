//! Text-completion capability and a mock implementation.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;

/// An external model that turns one prompt into one plain-text reply.
///
/// No streaming and no structured output.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Identifier of the model behind this capability.
    fn model_name(&self) -> &str;
}

/// Mock completion service for testing.
///
/// Returns a canned reply (or a canned failure) for every prompt and records
/// the prompts it was given.
#[derive(Debug)]
pub struct MockCompletion {
    outcome: Result<String, ProviderError>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    /// Create a mock with a default advisory reply.
    pub fn new() -> Self {
        Self::with_text("Mock advice: consider filtering the water before irrigation.")
    }

    /// Create a mock that replies with the specified text.
    pub fn with_text(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            outcome: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.outcome.clone()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
