pub mod config;
pub mod error;
pub mod labels;
pub mod types;

pub use config::HydroConfig;
pub use error::{HydroError, Result};
pub use labels::Labels;
pub use types::*;
