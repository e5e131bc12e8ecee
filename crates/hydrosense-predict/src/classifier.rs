//! Binary classifiers that consume a scaled feature vector.

use std::fmt::Debug;
use std::sync::Mutex;

use hydrosense_core::Potability;
use serde::{Deserialize, Serialize};

/// A pre-trained two-class model.
///
/// Implementations assume `features.len() == self.n_features()`; callers
/// check the dimension before invoking them.
pub trait BinaryClassifier: Send + Sync + Debug {
    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;

    /// Signed distance from the decision boundary. Positive means class 1.
    fn decision_function(&self, features: &[f64]) -> f64;

    /// Predicted class.
    fn predict(&self, features: &[f64]) -> Potability {
        if self.decision_function(features) > 0.0 {
            Potability::Suitable
        } else {
            Potability::Unsuitable
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ---------------------------------------------------------------------------
// Linear model
// ---------------------------------------------------------------------------

/// `w · x + b`, e.g. a logistic regression or linear SVM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl BinaryClassifier for LinearClassifier {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn decision_function(&self, features: &[f64]) -> f64 {
        dot(&self.weights, features) + self.intercept
    }
}

// ---------------------------------------------------------------------------
// Kernel SVM
// ---------------------------------------------------------------------------

/// Kernel function of a support vector classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: u32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    pub fn apply(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let sq_dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * sq_dist).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(i32::try_from(degree).unwrap_or(i32::MAX)),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }

    /// Every kernel coefficient is a finite number.
    pub fn is_finite(&self) -> bool {
        match *self {
            Kernel::Linear => true,
            Kernel::Rbf { gamma } => gamma.is_finite(),
            Kernel::Poly { gamma, coef0, .. } | Kernel::Sigmoid { gamma, coef0 } => {
                gamma.is_finite() && coef0.is_finite()
            }
        }
    }
}

/// Two-class SVC in dual form:
/// `Σ dual_coef[i] · K(support_vectors[i], x) + intercept`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
}

impl BinaryClassifier for SupportVectorClassifier {
    fn n_features(&self) -> usize {
        self.support_vectors.first().map_or(0, Vec::len)
    }

    fn decision_function(&self, features: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel.apply(sv, features))
            .sum::<f64>()
            + self.intercept
    }
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Test classifier: decision is `sum(features) - threshold`.
///
/// Records every feature vector it receives so tests can inspect what the
/// predictor actually fed the model.
#[derive(Debug, Default)]
pub struct MockClassifier {
    n_features: usize,
    threshold: f64,
    seen: Mutex<Vec<Vec<f64>>>,
}

impl MockClassifier {
    pub fn new(n_features: usize, threshold: f64) -> Self {
        Self {
            n_features,
            threshold,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Feature vectors passed to `decision_function`, oldest first.
    pub fn seen(&self) -> Vec<Vec<f64>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl BinaryClassifier for MockClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn decision_function(&self, features: &[f64]) -> f64 {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(features.to_vec());
        }
        features.iter().sum::<f64>() - self.threshold
    }
}
