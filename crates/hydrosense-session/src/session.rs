//! State of one user's advisory session.

use chrono::{DateTime, Duration, Utc};
use hydrosense_advisor::AdvisoryResponder;
use hydrosense_core::{
    ChatTranscript, ChatTurn, Language, PotabilityResult, WaterSample,
};
use hydrosense_predict::PotabilityPredictor;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::SessionError;

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub language: Language,
    pub sample: Option<WaterSample>,
    pub result: Option<PotabilityResult>,
    pub transcript: ChatTranscript,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// Current sample, latest prediction, transcript, and language for one user.
#[derive(Debug, Clone)]
pub struct AdvisorySession {
    id: Uuid,
    sample: Option<WaterSample>,
    result: Option<PotabilityResult>,
    transcript: ChatTranscript,
    language: Language,
    max_message_length: usize,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl AdvisorySession {
    pub fn new(language: Language, max_message_length: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sample: None,
            result: None,
            transcript: ChatTranscript::new(),
            language,
            max_message_length,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sample(&self) -> Option<&WaterSample> {
        self.sample.as_ref()
    }

    pub fn result(&self) -> Option<&PotabilityResult> {
        self.result.as_ref()
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    /// Validate and store a new sample, then predict its potability.
    ///
    /// An invalid sample leaves the previous sample and result untouched.
    pub fn analyze(
        &mut self,
        sample: WaterSample,
        predictor: &PotabilityPredictor,
    ) -> Result<PotabilityResult, SessionError> {
        sample.validate()?;
        self.touch();
        let result = predictor.evaluate(&sample);
        debug!(session_id = %self.id, label = ?result.label(), "Sample analyzed");
        self.sample = Some(sample);
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Ask the advisor about the current sample.
    ///
    /// Refuses with [`SessionError::NoSample`] before any sample has been
    /// analyzed. On success the user message and the reply are appended
    /// together; a provider failure is appended as an `Error: ...` reply.
    pub async fn send_message(
        &mut self,
        message: &str,
        responder: &AdvisoryResponder,
    ) -> Result<&ChatTurn, SessionError> {
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_length {
            return Err(SessionError::MessageTooLong(self.max_message_length));
        }
        let sample = self.sample.ok_or(SessionError::NoSample)?;

        self.touch();
        let reply = responder
            .respond(&sample, &self.transcript, message, self.language)
            .await;
        debug!(
            session_id = %self.id,
            failed = reply.is_failure(),
            turns = self.transcript.len() + 2,
            "Advisory exchange appended"
        );
        Ok(self.transcript.push_exchange(message, reply.into_text()))
    }

    /// Empty the transcript. Sample and result are kept.
    pub fn clear_chat(&mut self) {
        self.touch();
        self.transcript.clear();
    }

    /// Forget the sample and its result. The transcript is kept.
    pub fn reset_params(&mut self) {
        self.touch();
        self.sample = None;
        self.result = None;
    }

    /// Switch display and reply language. Existing turns are unchanged.
    pub fn set_language(&mut self, language: Language) {
        self.touch();
        self.language = language;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            language: self.language,
            sample: self.sample,
            result: self.result.clone(),
            transcript: self.transcript.clone(),
            created_at: self.created_at,
            last_active_at: self.last_active_at,
        }
    }

    /// Whether the session has been idle for longer than `timeout`.
    pub fn is_idle_for(&self, timeout: Duration) -> bool {
        Utc::now() - self.last_active_at > timeout
    }

    fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        self.last_active_at -= by;
    }
}
