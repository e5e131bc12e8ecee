//! Per-user session state for HydroSense.
//!
//! A session holds the current water sample, its latest prediction, the chat
//! transcript, and the language setting. The orchestrator owns the predictor
//! and responder and routes each user action to the right session.

pub mod error;
pub mod orchestrator;
pub mod session;

pub use error::SessionError;
pub use orchestrator::{Analysis, Exchange, SessionListing, SessionOrchestrator, SessionSummary};
pub use session::{AdvisorySession, SessionSnapshot};
