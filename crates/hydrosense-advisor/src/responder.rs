//! Advisory chat responder.

use std::sync::Arc;

use hydrosense_core::{ChatTranscript, Language, WaterSample};
use tracing::{debug, warn};

use crate::completion::TextCompletion;
use crate::error::ProviderError;
use crate::prompt::build_prompt;

/// Outcome of one advisory call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryReply {
    /// Text generated by the model.
    Advice(String),
    /// The provider call failed; carries the failure description.
    Failed(String),
}

impl AdvisoryReply {
    pub fn is_failure(&self) -> bool {
        matches!(self, AdvisoryReply::Failed(_))
    }

    /// Text to show the user and append to the transcript.
    pub fn into_text(self) -> String {
        match self {
            AdvisoryReply::Advice(text) => text,
            AdvisoryReply::Failed(message) => format!("Error: {}", message),
        }
    }
}

/// Builds the advisory prompt and forwards it to the completion capability.
#[derive(Clone)]
pub struct AdvisoryResponder {
    completion: Arc<dyn TextCompletion>,
}

impl AdvisoryResponder {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    pub fn model_name(&self) -> &str {
        self.completion.model_name()
    }

    /// Prompt the model and return its raw result.
    pub async fn try_respond(
        &self,
        sample: &WaterSample,
        history: &ChatTranscript,
        message: &str,
        language: Language,
    ) -> Result<String, ProviderError> {
        let prompt = build_prompt(sample, history, message, language);
        debug!(
            model = self.completion.model_name(),
            history_turns = history.len(),
            %language,
            prompt_chars = prompt.len(),
            "Requesting advisory completion"
        );
        self.completion.complete(&prompt).await
    }

    /// Prompt the model; failures become [`AdvisoryReply::Failed`].
    pub async fn respond(
        &self,
        sample: &WaterSample,
        history: &ChatTranscript,
        message: &str,
        language: Language,
    ) -> AdvisoryReply {
        match self.try_respond(sample, history, message, language).await {
            Ok(text) => AdvisoryReply::Advice(text),
            Err(e) => {
                warn!(error = %e, model = self.completion.model_name(), "Advisory call failed");
                AdvisoryReply::Failed(e.to_string())
            }
        }
    }
}
