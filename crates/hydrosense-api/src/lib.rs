//! HydroSense API crate - axum HTTP server and route handlers.
//!
//! Exposes parameter metadata, session lifecycle, sample analysis, and the
//! advisory chat over a JSON REST API.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
