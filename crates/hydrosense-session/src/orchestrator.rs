//! Session orchestrator: routes user actions to per-session state.
//!
//! Sessions are independent. Actions on one session are serialized by that
//! session's own lock, so a chat exchange runs to completion before the next
//! action on the same session starts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use hydrosense_advisor::AdvisoryResponder;
use hydrosense_core::config::ChatConfig;
use hydrosense_core::{ChatTurn, Language, PotabilityResult, WaterSample};
use hydrosense_predict::PotabilityPredictor;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;
use crate::session::{AdvisorySession, SessionSnapshot};

type SharedSession = Arc<AsyncMutex<AdvisorySession>>;

/// Short description of a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub language: Language,
    pub has_sample: bool,
    pub turn_count: usize,
    pub last_active_at: DateTime<Utc>,
}

/// Idle sessions, plus how many were mid-action and skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionListing {
    pub sessions: Vec<SessionSummary>,
    pub busy: usize,
}

/// Outcome of an analysis, read under the session lock.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub result: PotabilityResult,
    pub language: Language,
}

/// Outcome of one chat exchange, read under the session lock.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub reply: ChatTurn,
    pub turn_count: usize,
    pub language: Language,
}

/// Owns the predictor, the responder, and every live session.
pub struct SessionOrchestrator {
    predictor: PotabilityPredictor,
    responder: AdvisoryResponder,
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
    config: ChatConfig,
}

impl SessionOrchestrator {
    pub fn new(
        predictor: PotabilityPredictor,
        responder: AdvisoryResponder,
        config: ChatConfig,
    ) -> Self {
        Self {
            predictor,
            responder,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn predictor(&self) -> &PotabilityPredictor {
        &self.predictor
    }

    pub fn responder(&self) -> &AdvisoryResponder {
        &self.responder
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Start a session with no sample and an empty transcript.
    pub fn create_session(&self, language: Option<Language>) -> Result<Uuid, SessionError> {
        let session = AdvisorySession::new(
            language.unwrap_or(self.config.default_language),
            self.config.max_message_length,
        );
        let id = session.id();
        self.lock_sessions()?
            .insert(id, Arc::new(AsyncMutex::new(session)));
        info!(session_id = %id, "Session created");
        Ok(id)
    }

    pub async fn analyze(&self, id: Uuid, sample: WaterSample) -> Result<Analysis, SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        let result = session.analyze(sample, &self.predictor)?;
        Ok(Analysis {
            result,
            language: session.language(),
        })
    }

    /// Send a chat message and return the appended assistant turn.
    pub async fn send_message(&self, id: Uuid, message: &str) -> Result<Exchange, SessionError> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        let reply = session.send_message(message, &self.responder).await?.clone();
        Ok(Exchange {
            reply,
            turn_count: session.transcript().len(),
            language: session.language(),
        })
    }

    pub async fn language(&self, id: Uuid) -> Result<Language, SessionError> {
        Ok(self.session(id)?.lock().await.language())
    }

    pub async fn clear_chat(&self, id: Uuid) -> Result<(), SessionError> {
        self.session(id)?.lock().await.clear_chat();
        Ok(())
    }

    pub async fn reset_params(&self, id: Uuid) -> Result<(), SessionError> {
        self.session(id)?.lock().await.reset_params();
        Ok(())
    }

    pub async fn set_language(&self, id: Uuid, language: Language) -> Result<(), SessionError> {
        self.session(id)?.lock().await.set_language(language);
        Ok(())
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        Ok(self.session(id)?.lock().await.snapshot())
    }

    pub fn delete_session(&self, id: Uuid) -> Result<(), SessionError> {
        if self.lock_sessions()?.remove(&id).is_some() {
            info!(session_id = %id, "Session deleted");
            Ok(())
        } else {
            Err(SessionError::SessionNotFound(id))
        }
    }

    /// Summaries of all live sessions, most recently active first.
    ///
    /// Never waits on a session lock: sessions busy with an action (usually
    /// an LLM call) are left out and counted in `busy`.
    pub fn list_sessions(&self) -> Result<SessionListing, SessionError> {
        let sessions = self.lock_sessions()?;
        let mut listing = SessionListing::default();
        for handle in sessions.values() {
            match handle.try_lock() {
                Ok(session) => listing.sessions.push(SessionSummary {
                    id: session.id(),
                    language: session.language(),
                    has_sample: session.sample().is_some(),
                    turn_count: session.transcript().len(),
                    last_active_at: session.last_active_at(),
                }),
                Err(_) => listing.busy += 1,
            }
        }
        listing
            .sessions
            .sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(listing)
    }

    /// Drop idle sessions. Sessions busy with an action are kept.
    ///
    /// Returns the number of sessions removed.
    pub fn purge_expired(&self) -> Result<usize, SessionError> {
        let timeout = self.idle_timeout();
        let mut sessions = self.lock_sessions()?;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_idle_for(timeout),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired sessions purged");
        }
        Ok(removed)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    // -- Private helpers --

    /// Look up a live session, discarding it first if it has been idle too long.
    fn session(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        let mut sessions = self.lock_sessions()?;
        let handle = sessions
            .get(&id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(id))?;

        let expired = handle
            .try_lock()
            .map(|s| s.is_idle_for(self.idle_timeout()))
            .unwrap_or(false);
        if expired {
            sessions.remove(&id);
            debug!(session_id = %id, "Session expired");
            return Err(SessionError::SessionNotFound(id));
        }
        Ok(handle)
    }

    fn idle_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.config.session_timeout_minutes))
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SharedSession>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|e| SessionError::Internal(format!("session lock poisoned: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
