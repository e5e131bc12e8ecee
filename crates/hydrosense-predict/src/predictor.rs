//! Load-once model state and the potability predictor.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use hydrosense_core::config::{ModelConfig, ScalerMode};
use hydrosense_core::{Potability, PotabilityResult, WaterSample};
use tracing::{debug, info, warn};

use crate::artifact::ModelArtifact;
use crate::classifier::BinaryClassifier;
use crate::error::PredictError;
use crate::scaler::StandardScaler;

/// A classifier ready for inference, with the scaler persisted alongside it.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub classifier: Arc<dyn BinaryClassifier>,
    pub scaler: Option<StandardScaler>,
}

/// Process-wide classifier state, initialized once at startup.
#[derive(Clone)]
pub enum ModelState {
    Loaded(LoadedModel),
    Unavailable(String),
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Loaded(model) => f
                .debug_struct("Loaded")
                .field("n_features", &model.classifier.n_features())
                .field("has_scaler", &model.scaler.is_some())
                .finish(),
            ModelState::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl ModelState {
    /// Load the artifact named in the config.
    ///
    /// Never fails: a missing or invalid artifact yields `Unavailable`.
    pub fn load(config: &ModelConfig) -> Self {
        let path = Path::new(&config.path);
        match ModelArtifact::load(path) {
            Ok(artifact) => Self::from_artifact(artifact, config.scaler_mode),
            Err(PredictError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Model artifact not found. Prediction functionality will not work."
                );
                Self::Unavailable(format!("model artifact not found at {}", path.display()))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load model artifact");
                Self::Unavailable(e.to_string())
            }
        }
    }

    /// Build state from an already-validated artifact.
    pub fn from_artifact(artifact: ModelArtifact, scaler_mode: ScalerMode) -> Self {
        if scaler_mode == ScalerMode::Persisted && artifact.scaler.is_none() {
            warn!("scaler_mode is 'persisted' but the artifact has no fitted scaler");
            return Self::Unavailable("model artifact has no persisted scaler".to_string());
        }
        if scaler_mode == ScalerMode::RefitPerSample {
            warn!(
                "scaler_mode is 'refit_per_sample': every sample scales to the zero vector, \
                 so predictions do not depend on the input"
            );
        }
        Self::Loaded(LoadedModel {
            classifier: artifact.classifier.into_classifier(),
            scaler: artifact.scaler,
        })
    }

    pub fn loaded(classifier: Arc<dyn BinaryClassifier>, scaler: Option<StandardScaler>) -> Self {
        Self::Loaded(LoadedModel { classifier, scaler })
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }
}

/// Scales a sample and runs the classifier on it.
///
/// Cheap to clone; the model state is shared.
#[derive(Clone, Debug)]
pub struct PotabilityPredictor {
    state: Arc<ModelState>,
    scaler_mode: ScalerMode,
}

impl PotabilityPredictor {
    pub fn new(state: Arc<ModelState>, scaler_mode: ScalerMode) -> Self {
        Self { state, scaler_mode }
    }

    /// Load the artifact named in the config and wrap it.
    pub fn from_config(config: &ModelConfig) -> Self {
        let state = ModelState::load(config);
        info!(
            loaded = state.is_loaded(),
            scaler_mode = ?config.scaler_mode,
            "Potability predictor initialized"
        );
        Self::new(Arc::new(state), config.scaler_mode)
    }

    pub fn is_available(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn scaler_mode(&self) -> ScalerMode {
        self.scaler_mode
    }

    /// Predict the potability class of one sample.
    pub fn predict(&self, sample: &WaterSample) -> Result<Potability, PredictError> {
        let model = match self.state.as_ref() {
            ModelState::Loaded(model) => model,
            ModelState::Unavailable(reason) => {
                return Err(PredictError::ModelUnavailable(reason.clone()))
            }
        };

        sample.validate()?;
        let features = sample.features();
        let expected = model.classifier.n_features();
        if expected != features.len() {
            return Err(PredictError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let scaled = self.scale(model, &features)?;
        let potability = model.classifier.predict(&scaled);
        debug!(label = potability.label(), "Potability predicted");
        Ok(potability)
    }

    /// Like [`predict`](Self::predict), folding any failure into
    /// `PotabilityResult::Unavailable`.
    pub fn evaluate(&self, sample: &WaterSample) -> PotabilityResult {
        match self.predict(sample) {
            Ok(potability) => PotabilityResult::Predicted { potability },
            Err(e) => {
                warn!(error = %e, "Prediction unavailable");
                let reason = match e {
                    PredictError::ModelUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                PotabilityResult::Unavailable { reason }
            }
        }
    }

    fn scale(&self, model: &LoadedModel, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        match self.scaler_mode {
            ScalerMode::RefitPerSample => StandardScaler::fit(&[features])?.transform(features),
            ScalerMode::Persisted => model
                .scaler
                .as_ref()
                .ok_or_else(|| {
                    PredictError::ModelUnavailable("model has no persisted scaler".to_string())
                })?
                .transform(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ClassifierSpec;
    use crate::classifier::{Kernel, LinearClassifier, MockClassifier, SupportVectorClassifier};
    use hydrosense_core::{Parameter, FEATURE_COUNT};
    use std::io::Write;

    fn reference_sample() -> WaterSample {
        WaterSample::default()
    }

    fn varied_samples() -> Vec<WaterSample> {
        vec![
            WaterSample::default(),
            WaterSample::from_features([0.0; FEATURE_COUNT]),
            WaterSample::from_features([14.0, 500.0, 50_000.0, 10.0, 500.0, 1000.0, 20.0, 100.0, 10.0]),
            WaterSample::from_features([3.2, 47.0, 320.0, 0.4, 12.0, 180.0, 2.2, 8.0, 0.5]),
            WaterSample::from_features([9.9, 310.0, 41_000.0, 9.1, 480.0, 910.0, 18.5, 97.0, 6.4]),
        ]
    }

    /// Scaler that centres on the form defaults, so the default sample maps to zero.
    fn training_scaler() -> StandardScaler {
        StandardScaler::new(
            WaterSample::default().features().to_vec(),
            vec![1.5, 33.0, 8700.0, 1.6, 41.0, 81.0, 3.3, 16.0, 0.78],
        )
        .unwrap()
    }

    fn ph_model() -> Arc<dyn BinaryClassifier> {
        // Suitable iff scaled pH is above the training mean.
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[Parameter::Ph.index()] = 1.0;
        Arc::new(LinearClassifier {
            weights,
            intercept: 0.0,
        })
    }

    fn rbf_model() -> Arc<dyn BinaryClassifier> {
        Arc::new(SupportVectorClassifier {
            kernel: Kernel::Rbf { gamma: 0.2 },
            support_vectors: vec![vec![0.5; FEATURE_COUNT], vec![-1.5; FEATURE_COUNT]],
            dual_coef: vec![1.0, -1.0],
            intercept: -0.05,
        })
    }

    // ---- Unavailable ----

    #[test]
    fn test_unavailable_model_returns_structured_error() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::unavailable("model not loaded")),
            ScalerMode::RefitPerSample,
        );
        assert!(!predictor.is_available());
        let err = predictor.predict(&reference_sample()).unwrap_err();
        assert!(matches!(err, PredictError::ModelUnavailable(ref r) if r == "model not loaded"));
    }

    #[test]
    fn test_unavailable_model_evaluates_to_sentinel() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::unavailable("model not loaded")),
            ScalerMode::RefitPerSample,
        );
        assert_eq!(
            predictor.evaluate(&reference_sample()),
            PotabilityResult::Unavailable {
                reason: "model not loaded".to_string()
            }
        );
    }

    #[test]
    fn test_load_missing_artifact_is_unavailable() {
        let config = ModelConfig {
            path: "/nonexistent/dir/model.json".to_string(),
            scaler_mode: ScalerMode::RefitPerSample,
        };
        let predictor = PotabilityPredictor::from_config(&config);
        assert!(!predictor.is_available());
        match predictor.evaluate(&reference_sample()) {
            PotabilityResult::Unavailable { reason } => assert!(reason.contains("not found")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_load_malformed_artifact_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json at all").unwrap();
        let config = ModelConfig {
            path: file.path().to_string_lossy().to_string(),
            scaler_mode: ScalerMode::RefitPerSample,
        };
        let state = ModelState::load(&config);
        assert!(!state.is_loaded());
    }

    #[test]
    fn test_persisted_mode_without_scaler_is_unavailable() {
        let artifact = ModelArtifact::new(
            ClassifierSpec::Linear(LinearClassifier {
                weights: vec![1.0; FEATURE_COUNT],
                intercept: 0.0,
            }),
            None,
        );
        let state = ModelState::from_artifact(artifact, ScalerMode::Persisted);
        assert!(!state.is_loaded());
    }

    // ---- Refit-per-sample compatibility behavior ----

    #[test]
    fn test_refit_mode_feeds_zero_vector() {
        let mock = Arc::new(MockClassifier::new(FEATURE_COUNT, 0.0));
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::loaded(mock.clone(), None)),
            ScalerMode::RefitPerSample,
        );
        for sample in varied_samples() {
            predictor.predict(&sample).unwrap();
        }
        let seen = mock.seen();
        assert_eq!(seen.len(), varied_samples().len());
        assert!(seen.iter().all(|v| v.iter().all(|x| *x == 0.0)));
    }

    #[test]
    fn test_refit_mode_output_is_constant_for_any_input() {
        for model in [ph_model(), rbf_model()] {
            let predictor = PotabilityPredictor::new(
                Arc::new(ModelState::loaded(model, Some(training_scaler()))),
                ScalerMode::RefitPerSample,
            );
            let labels: Vec<u8> = varied_samples()
                .iter()
                .map(|s| predictor.predict(s).unwrap().label())
                .collect();
            assert!(labels.iter().all(|l| *l == labels[0]), "labels: {:?}", labels);
        }
    }

    // ---- Persisted scaler ----

    #[test]
    fn test_persisted_mode_depends_on_input() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::loaded(ph_model(), Some(training_scaler()))),
            ScalerMode::Persisted,
        );
        let mut alkaline = reference_sample();
        alkaline.ph = 8.2;
        let mut acidic = reference_sample();
        acidic.ph = 5.9;
        assert_eq!(predictor.predict(&alkaline).unwrap(), Potability::Suitable);
        assert_eq!(predictor.predict(&acidic).unwrap(), Potability::Unsuitable);
    }

    #[test]
    fn test_persisted_mode_without_scaler_errors_at_predict() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::loaded(ph_model(), None)),
            ScalerMode::Persisted,
        );
        assert!(matches!(
            predictor.predict(&reference_sample()).unwrap_err(),
            PredictError::ModelUnavailable(_)
        ));
    }

    // ---- Validation ----

    #[test]
    fn test_invalid_sample_rejected() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::loaded(ph_model(), None)),
            ScalerMode::RefitPerSample,
        );
        let mut sample = reference_sample();
        sample.ph = 15.0;
        assert!(matches!(
            predictor.predict(&sample).unwrap_err(),
            PredictError::InvalidSample(_)
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let predictor = PotabilityPredictor::new(
            Arc::new(ModelState::loaded(Arc::new(MockClassifier::new(4, 0.0)), None)),
            ScalerMode::RefitPerSample,
        );
        assert!(matches!(
            predictor.predict(&reference_sample()).unwrap_err(),
            PredictError::DimensionMismatch {
                expected: 4,
                actual: 9
            }
        ));
    }

    // ---- End to end from disk ----

    #[test]
    fn test_reference_sample_from_artifact_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = ModelArtifact::new(
            ClassifierSpec::Svc(SupportVectorClassifier {
                kernel: Kernel::Rbf { gamma: 0.111 },
                support_vectors: vec![vec![0.3; FEATURE_COUNT], vec![-0.4; FEATURE_COUNT]],
                dual_coef: vec![0.8, -0.8],
                intercept: 0.1,
            }),
            Some(training_scaler()),
        );
        artifact.save(&path).unwrap();

        for mode in [ScalerMode::RefitPerSample, ScalerMode::Persisted] {
            let predictor = PotabilityPredictor::from_config(&ModelConfig {
                path: path.to_string_lossy().to_string(),
                scaler_mode: mode,
            });
            assert!(predictor.is_available());
            let label = predictor.evaluate(&reference_sample()).label();
            assert!(matches!(label, Some(0) | Some(1)));
        }
    }
}
