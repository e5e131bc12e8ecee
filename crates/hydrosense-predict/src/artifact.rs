//! On-disk classifier artifact.
//!
//! The artifact is a JSON document exported once after training. It carries
//! the classifier parameters and, optionally, the scaler statistics learned
//! on the training set.

use std::path::Path;
use std::sync::Arc;

use hydrosense_core::{Parameter, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::{BinaryClassifier, Kernel, LinearClassifier, SupportVectorClassifier};
use crate::error::PredictError;
use crate::scaler::StandardScaler;

/// Artifact layout version understood by this build.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Classifier parameters, tagged by model family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    Linear(LinearClassifier),
    Svc(SupportVectorClassifier),
}

impl ClassifierSpec {
    pub fn into_classifier(self) -> Arc<dyn BinaryClassifier> {
        match self {
            ClassifierSpec::Linear(model) => Arc::new(model),
            ClassifierSpec::Svc(model) => Arc::new(model),
        }
    }

    fn validate(&self) -> Result<(), PredictError> {
        match self {
            ClassifierSpec::Linear(model) => {
                check_width("weights", model.weights.len())?;
                if !model.intercept.is_finite() || model.weights.iter().any(|w| !w.is_finite()) {
                    return Err(PredictError::InvalidArtifact(
                        "linear model contains a non-finite coefficient".into(),
                    ));
                }
            }
            ClassifierSpec::Svc(model) => {
                if model.support_vectors.is_empty() {
                    return Err(PredictError::InvalidArtifact(
                        "svc has no support vectors".into(),
                    ));
                }
                if model.dual_coef.len() != model.support_vectors.len() {
                    return Err(PredictError::InvalidArtifact(format!(
                        "svc has {} support vectors but {} dual coefficients",
                        model.support_vectors.len(),
                        model.dual_coef.len()
                    )));
                }
                for sv in &model.support_vectors {
                    check_width("support vector", sv.len())?;
                }
                if let Kernel::Poly { degree, .. } = model.kernel {
                    if i32::try_from(degree).is_err() {
                        return Err(PredictError::InvalidArtifact(format!(
                            "poly kernel degree {} is too large",
                            degree
                        )));
                    }
                }
                let finite = model.intercept.is_finite()
                    && model.kernel.is_finite()
                    && model.dual_coef.iter().all(|c| c.is_finite())
                    && model.support_vectors.iter().flatten().all(|x| x.is_finite());
                if !finite {
                    return Err(PredictError::InvalidArtifact(
                        "svc contains a non-finite coefficient".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_width(what: &str, len: usize) -> Result<(), PredictError> {
    if len != FEATURE_COUNT {
        return Err(PredictError::InvalidArtifact(format!(
            "{} has {} features, expected {}",
            what, len, FEATURE_COUNT
        )));
    }
    Ok(())
}

/// A serialized potability classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Training column order. Checked against the expected order when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub classifier: ClassifierSpec,
    /// Scaler fitted on the training set, if it was exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
}

impl ModelArtifact {
    pub fn new(classifier: ClassifierSpec, scaler: Option<StandardScaler>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: Some(Parameter::ALL.iter().map(|p| p.key().to_string()).collect()),
            classifier,
            scaler,
        }
    }

    /// Read and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let content = std::fs::read_to_string(path)?;
        let artifact = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            has_scaler = artifact.scaler.is_some(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Parse and validate an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), PredictError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PredictError::InvalidArtifact(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        if let Some(names) = &self.feature_names {
            let expected: Vec<&str> = Parameter::ALL.iter().map(|p| p.key()).collect();
            if names.len() != expected.len() || names.iter().zip(&expected).any(|(a, b)| a != b) {
                return Err(PredictError::InvalidArtifact(format!(
                    "feature_names {:?} do not match training order {:?}",
                    names, expected
                )));
            }
        }

        self.classifier.validate()?;

        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
            check_width("scaler", scaler.dimensions())?;
        }
        Ok(())
    }
}
