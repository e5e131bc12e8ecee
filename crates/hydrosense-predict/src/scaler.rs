//! Standard (z-score) feature scaling.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Per-feature standardization: `(x - mean) / scale`.
///
/// Variance is the population variance. Features with zero variance get a
/// scale of 1.0 so they map to zero rather than dividing by zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from persisted statistics.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, PredictError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Fit mean and scale over the given rows.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, PredictError> {
        let first = rows
            .first()
            .ok_or_else(|| PredictError::InvalidSample("cannot fit scaler on zero rows".into()))?;
        let dims = first.as_ref().len();
        for row in rows {
            let actual = row.as_ref().len();
            if actual != dims {
                return Err(PredictError::DimensionMismatch {
                    expected: dims,
                    actual,
                });
            }
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; dims];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.as_ref()) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut variance = vec![0.0; dims];
        for row in rows {
            for ((v, x), m) in variance.iter_mut().zip(row.as_ref()).zip(&mean) {
                *v += (x - m).powi(2);
            }
        }
        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std <= f64::EPSILON {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Standardize a single feature vector.
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        if features.len() != self.mean.len() {
            return Err(PredictError::DimensionMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }

    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Check shapes agree and every scale is finite and non-zero.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.mean.len() != self.scale.len() {
            return Err(PredictError::InvalidArtifact(format!(
                "scaler mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(PredictError::InvalidArtifact(
                "scaler mean contains a non-finite value".into(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(PredictError::InvalidArtifact(
                "scaler scale must be finite and non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_single_row_yields_zero_vector() {
        let row = [7.0, 100.0, 500.0, 4.0, 250.0, 400.0, 10.0, 50.0, 3.0];
        let scaler = StandardScaler::fit(&[row]).unwrap();
        assert_eq!(scaler.mean(), &row);
        assert!(scaler.scale().iter().all(|s| *s == 1.0));

        let scaled = scaler.transform(&row).unwrap();
        assert!(scaled.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_fit_population_variance() {
        let rows = [[1.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        // population std of {1, 3} is 1.0; constant column falls back to 1.0
        assert_eq!(scaler.scale(), &[1.0, 1.0]);

        let rows = [[0.0], [4.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scale(), &[2.0]);
        assert_eq!(scaler.transform(&[6.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_fit_rejects_empty_and_ragged() {
        let empty: [[f64; 2]; 0] = [];
        assert!(StandardScaler::fit(&empty).is_err());

        let ragged: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            StandardScaler::fit(&ragged).unwrap_err(),
            PredictError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_transform_dimension_mismatch() {
        let scaler = StandardScaler::new(vec![0.0; 9], vec![1.0; 9]).unwrap();
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PredictError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_zero_scale() {
        assert!(StandardScaler::new(vec![0.0], vec![0.0]).is_err());
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_deserialize_persisted_statistics() {
        let json = r#"{"mean": [7.08, 196.4], "scale": [1.47, 32.9]}"#;
        let scaler: StandardScaler = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.dimensions(), 2);
        let scaled = scaler.transform(&[7.08, 229.3]).unwrap();
        assert_eq!(scaled[0], 0.0);
        assert!((scaled[1] - 1.0).abs() < 1e-9);
    }
}
