//! Potability prediction for HydroSense.
//!
//! Loads a serialized binary classifier once at startup, scales the nine
//! input features, and returns a 0/1 potability label. A missing or broken
//! artifact degrades every prediction to "model unavailable" instead of
//! failing the process.

pub mod artifact;
pub mod classifier;
pub mod error;
pub mod predictor;
pub mod scaler;

pub use artifact::{ClassifierSpec, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use classifier::{
    BinaryClassifier, Kernel, LinearClassifier, MockClassifier, SupportVectorClassifier,
};
pub use error::PredictError;
pub use predictor::{LoadedModel, ModelState, PotabilityPredictor};
pub use scaler::StandardScaler;
