//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use hydrosense_core::HydroConfig;
use hydrosense_session::SessionOrchestrator;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, read-only after startup.
    pub config: Arc<HydroConfig>,
    /// Session orchestrator owning the predictor and responder.
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: HydroConfig, orchestrator: SessionOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
